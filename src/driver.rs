use std::{
    ffi::OsStr,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use log::{debug, info, trace};

use crate::{
    ast::CommandKind,
    config::{Config, Input},
    error::{Error, ParseError, Result},
    parser::Parser,
    translator::Translator,
};

fn write_lines<W: Write>(out: &mut W, lines: &[String], path: &Path) -> Result<()> {
    for line in lines {
        writeln!(out, "{}", line).map_err(|e| Error::io(path, e))?;
    }
    Ok(())
}

/// Translates one source, streaming each command's code into `out`.
///
/// `name` is the namespace used for the source's static symbols. `source` and
/// `output` only label errors.
pub fn translate_source<R: BufRead, W: Write>(
    translator: &mut Translator,
    name: &str,
    reader: R,
    out: &mut W,
    source: &Path,
    output: &Path,
) -> Result<()> {
    let mut parser = Parser::new(reader);
    let mut scope = translator.file(name);

    while parser.has_more_commands().map_err(|e| parse_error(source, e))? {
        let line = parser.line();
        let command = parser.advance().map_err(|e| parse_error(source, e))?;
        trace!("{}:{}: {:?} `{}`", name, line, command.kind(), command);
        if command.kind() == CommandKind::Function {
            debug!(
                "{}: function {} with {} locals",
                name,
                command.arg1().unwrap_or_default(),
                command.arg2().unwrap_or_default()
            );
        }
        let code = scope.translate(command);
        write_lines(out, &code, output)?;
    }

    debug!(
        "{}: translated {} lines, last command {:?}",
        scope.file(),
        parser.line(),
        parser.command().map(ToString::to_string)
    );
    Ok(())
}

fn parse_error(path: &Path, source: ParseError) -> Error {
    Error::Parse {
        path: path.to_path_buf(),
        source,
    }
}

/// Translates every input file of `config` into its single output file.
pub fn run(config: &Config) -> Result<()> {
    let output = &config.output;
    let file = File::create(output).map_err(|e| Error::io(output, e))?;
    let mut out = BufWriter::new(file);
    let mut translator = Translator::new().annotated(config.annotate);

    if let Input::Directory { dir, files } = &config.input {
        info!("{} source files in {}", files.len(), dir.display());
    }
    if config.bootstrap {
        write_lines(&mut out, &translator.bootstrap(), output)?;
    }

    for path in config.input.files() {
        let name = path
            .file_stem()
            .and_then(OsStr::to_str)
            .ok_or_else(|| Error::WrongExtension(path.clone()))?;
        info!("translating {}", path.display());

        let reader = File::open(path)
            .map(BufReader::new)
            .map_err(|e| Error::io(path, e))?;
        translate_source(&mut translator, name, reader, &mut out, path, output)?;
        debug!("last function after {}: {:?}", name, translator.current_function());
    }

    out.flush().map_err(|e| Error::io(output, e))?;
    info!("wrote {}", output.display());
    Ok(())
}
