//! Well-formedness checker CLI.
//!
//! Parses each input file with the tree builder and reports the first fatal
//! error with its system ID and line number. Optionally re-emits the parsed
//! tree, compact or pretty-printed.

use std::io::{self, Read, Write};
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;

use picoxml::dom::XmlWriter;
use picoxml::{Element, Reader, TreeBuilder, XmlParser};

/// xmlcheck -- parse XML files and report the first error.
#[derive(Parser, Debug)]
#[command(name = "xmlcheck", version, about, long_about = None)]
struct Cli {
    /// XML files to process (use `-` for stdin).
    #[arg(required = true)]
    files: Vec<String>,

    /// Re-emit the parsed tree on stdout.
    #[arg(long)]
    print: bool,

    /// Pretty-print the re-emitted tree (implies --print).
    #[arg(long)]
    pretty: bool,

    /// Suppress per-file success messages.
    #[arg(short, long)]
    quiet: bool,
}

const EXIT_SUCCESS: u8 = 0;
const EXIT_PARSE_ERROR: u8 = 1;
const EXIT_IO_ERROR: u8 = 2;

fn parse_input(file: &str) -> picoxml::Result<Element> {
    if file == "-" {
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .map_err(|e| picoxml::XmlError::Io {
                detail: e.to_string(),
                system_id: "<stdin>".to_string(),
                line: 1,
            })?;
        let mut reader = Reader::from_bytes(&bytes)?;
        reader.set_system_id("<stdin>");
        XmlParser::new(reader, TreeBuilder::new()).parse()
    } else {
        XmlParser::new(Reader::from_file(Path::new(file))?, TreeBuilder::new()).parse()
    }
}

fn emit(cli: &Cli, root: &Element) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if cli.pretty {
        XmlWriter::pretty(&mut out, 2).write(root)?;
    } else {
        XmlWriter::new(&mut out).write(root)?;
        writeln!(out)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut exit = EXIT_SUCCESS;
    for file in &cli.files {
        match parse_input(file) {
            Ok(root) => {
                if !cli.quiet {
                    eprintln!("{file}: well-formed, root element <{}>", root.full_name());
                }
                if cli.print || cli.pretty {
                    if let Err(e) = emit(&cli, &root) {
                        eprintln!("{file}: write failed: {e}");
                        exit = EXIT_IO_ERROR;
                    }
                }
            }
            Err(e) => {
                eprintln!("{file}: {e}");
                exit = EXIT_PARSE_ERROR;
            }
        }
    }
    exit.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_reported_as_io_error() {
        let result = parse_input("definitely/not/here.xml");
        assert!(matches!(result, Err(picoxml::XmlError::Io { .. })));
    }

    #[test]
    fn cli_parses_flags() {
        use clap::Parser as _;
        let cli = Cli::try_parse_from(["xmlcheck", "--pretty", "-q", "a.xml"]).unwrap();
        assert!(cli.pretty);
        assert!(cli.quiet);
        assert_eq!(cli.files, ["a.xml"]);
    }
}
