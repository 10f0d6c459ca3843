use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};

use crate::error::{Error, Result};

pub const VM_EXTENSION: &str = "vm";
pub const ASM_EXTENSION: &str = "asm";

/// What the translator reads.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    File(PathBuf),
    Directory { dir: PathBuf, files: Vec<PathBuf> },
}

impl Input {
    pub fn files(&self) -> &[PathBuf] {
        match self {
            Input::File(file) => std::slice::from_ref(file),
            Input::Directory { files, .. } => files,
        }
    }
}

#[derive(Debug)]
pub struct Config {
    pub input: Input,
    pub output: PathBuf,
    pub bootstrap: bool,
    pub annotate: bool,
}

fn is_vm_file(path: &Path) -> bool {
    path.extension() == Some(OsStr::new(VM_EXTENSION))
}

impl Config {
    /// Resolves a source path into the files to translate and the output file.
    pub fn new(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }

        let (input, output) = if path.is_file() {
            if !is_vm_file(path) {
                return Err(Error::WrongExtension(path.to_path_buf()));
            }
            (Input::File(path.to_path_buf()), path.with_extension(ASM_EXTENSION))
        } else if path.is_dir() {
            let files = vm_files(path)?;
            if files.is_empty() {
                return Err(Error::NoSources(path.to_path_buf()));
            }
            let dir = path.canonicalize().map_err(|e| Error::io(path, e))?;
            let mut name = dir
                .file_name()
                .ok_or_else(|| Error::InvalidPathKind(path.to_path_buf()))?
                .to_os_string();
            name.push(".");
            name.push(ASM_EXTENSION);
            let output = path.join(name);
            (
                Input::Directory {
                    dir: path.to_path_buf(),
                    files,
                },
                output,
            )
        } else {
            return Err(Error::InvalidPathKind(path.to_path_buf()));
        };

        Ok(Config {
            input,
            output,
            bootstrap: true,
            annotate: false,
        })
    }
}

/// Regular `.vm` files directly inside `dir`, sorted by name.
fn vm_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = vec![];
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if path.is_file() && is_vm_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn single_file_output_replaces_extension() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("SimpleAdd.vm");
        fs::write(&source, "push constant 1\n").unwrap();

        let config = Config::new(&source).unwrap();
        assert_eq!(config.input, Input::File(source));
        assert_eq!(config.output, dir.path().join("SimpleAdd.asm"));
        assert!(config.bootstrap);
    }

    #[test]
    fn directory_collects_vm_files() {
        let root = tempdir().unwrap();
        let dir = root.path().join("FibonacciElement");
        fs::create_dir(&dir).unwrap();
        fs::write(dir.join("Sys.vm"), "").unwrap();
        fs::write(dir.join("Main.vm"), "").unwrap();
        fs::write(dir.join("notes.txt"), "").unwrap();
        fs::create_dir(dir.join("nested.vm")).unwrap();

        let config = Config::new(&dir).unwrap();
        assert_eq!(
            config.input.files(),
            &[dir.join("Main.vm"), dir.join("Sys.vm")]
        );
        assert_eq!(config.output, dir.join("FibonacciElement.asm"));
    }

    #[test]
    fn usage_errors() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("Missing.vm");
        assert!(matches!(Config::new(&missing), Err(Error::NotFound(_))));

        let text = dir.path().join("prog.txt");
        fs::write(&text, "").unwrap();
        assert!(matches!(Config::new(&text), Err(Error::WrongExtension(_))));

        assert!(matches!(Config::new(dir.path()), Err(Error::NoSources(_))));
    }
}
