#[macro_use]
extern crate clap;

use clap::{App, Arg};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use sasm::Trace;
use std::fmt;
use std::fs::File;
use std::io::prelude::*;
use std::io::{self, BufReader, BufWriter};
use std::path::PathBuf;

#[derive(Debug)]
enum IOErrorContext {
    ReadInput,
    WriteOutput,
    Prompt,
}

#[derive(Debug)]
enum Error {
    Asm(sasm::AssemblyError),
    Io(std::io::Error, IOErrorContext, PathBuf),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err, context, path) => writeln!(
                f,
                "{} \"{}\" failed: {}",
                match context {
                    IOErrorContext::ReadInput => "Reading input file",
                    IOErrorContext::WriteOutput => "Writing output file",
                    IOErrorContext::Prompt => "Reading prompt answer from",
                },
                path.display(),
                err
            ),
            Error::Asm(err) => write!(f, "{}", err),
        }
    }
}

fn main() {
    // Parse command line arguments
    let matches = App::new(crate_name!())
        .version(crate_version!())
        .about(crate_description!())
        .arg(
            Arg::with_name("INPUT")
                .help("Sets the input file to assemble; <ask> prompts for a name")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("FORMAT")
                .help("Sets the output format")
                .possible_values(&["hex", "binstr", "file", "return"])
                .index(2),
        )
        .arg(
            Arg::with_name("interactive")
                .short("i")
                .long("interactive")
                .help("Streams assembly events to stdout for the visualizer"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Enables debug logging"),
        )
        .get_matches();

    if matches.is_present("verbose") {
        init_logging(LevelFilter::Debug);
    }

    let input = matches.value_of("INPUT").unwrap();
    let format = matches.value_of("FORMAT");
    let interactive = matches.is_present("interactive");

    if let Err(err) = run(input, format, interactive) {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run(input: &str, format: Option<&str>, interactive: bool) -> Result<(), Error> {
    let input_path = if input == "<ask>" {
        PathBuf::from(prompt("Input file: ")?)
    } else {
        PathBuf::from(input)
    };

    // Read input file
    let input_file = File::open(&input_path)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, input_path.clone()))?;
    let mut buf_reader = BufReader::new(input_file);
    let mut source = String::new();
    buf_reader
        .read_to_string(&mut source)
        .map_err(|err| Error::Io(err, IOErrorContext::ReadInput, input_path.clone()))?;

    // In interactive mode the event stream is the only output.
    if interactive {
        let stdout = io::stdout();
        let mut sink = stdout.lock();
        let mut trace = Trace::to_writer(&mut sink);
        sasm::assemble_traced(&source, &mut trace).map_err(Error::Asm)?;
        return Ok(());
    }

    let bytecode = sasm::assemble(&source).map_err(Error::Asm)?;

    let format = match format {
        Some(format) => format.to_owned(),
        None => prompt("What output format (hex, binstr or file)? ")?,
    };
    match format.as_str() {
        "hex" => print_hex(&bytecode, 16),
        "binstr" => print_binstr(&bytecode),
        "file" => {
            let output_path = PathBuf::from(prompt("Name of output file: ")?);
            write_bytecode(&bytecode, &output_path)
                .map_err(|err| Error::Io(err, IOErrorContext::WriteOutput, output_path))?;
        }
        // The byte buffer is the library-level result; nothing to emit.
        _ => {}
    }
    Ok(())
}

fn prompt(question: &str) -> Result<String, Error> {
    let ask = |question: &str| -> io::Result<String> {
        print!("{}", question);
        io::stdout().flush()?;
        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;
        Ok(answer.trim().to_owned())
    };
    ask(question).map_err(|err| Error::Io(err, IOErrorContext::Prompt, PathBuf::from("<stdin>")))
}

fn write_bytecode(bytecode: &[u8], path: &PathBuf) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(bytecode)?;
    Ok(())
}

fn print_hex(bytecode: &[u8], row_len: usize) {
    for (i, byte) in bytecode.iter().enumerate() {
        print!("{:02X} ", byte);
        if (i + 1) % row_len == 0 {
            println!();
        }
    }
    if bytecode.len() % row_len != 0 {
        println!();
    }
}

fn print_binstr(bytecode: &[u8]) {
    let mut literal = String::with_capacity(bytecode.len() * 4 + 3);
    literal.push_str("b\"");
    for &byte in bytecode {
        match byte {
            b'"' => literal.push_str("\\\""),
            b'\\' => literal.push_str("\\\\"),
            0x20..=0x7E => literal.push(byte as char),
            _ => literal.push_str(&format!("\\x{:02x}", byte)),
        }
    }
    literal.push('"');
    println!("{}", literal);
}

fn init_logging(level: LevelFilter) {
    let encoder = PatternEncoder::new("[{l}] {m}{n}");
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(encoder))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .unwrap();
    let _handle = log4rs::init_config(config).unwrap();
}
