use crate::codegen::Target;
use crate::error::emit_diagnostic;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::typeck::Resolver;
use anyhow::{anyhow, Context};
use codespan::Files;
use std::path::{Path, PathBuf};
use std::process::Command;

fn validate_sauce_file(path: &str) -> Result<PathBuf, String> {
    let path = Path::new(path);
    let path = if path.extension().is_none() {
        path.with_extension("sauce")
    } else {
        path.to_path_buf()
    };

    if !path.exists() {
        let suggestions = suggest_similar_files(&path)
            .map(|s| format!("\nDid you mean:\n{}", s))
            .unwrap_or_default();

        return Err(format!(
            "File '{}' not found.{}",
            path.display(),
            suggestions
        ));
    }
    Ok(path)
}

fn suggest_similar_files(missing_path: &Path) -> Option<String> {
    let dir = missing_path.parent()?;
    let target_name = missing_path.file_stem()?.to_string_lossy();
    let target_name = target_name.as_ref();

    let matches: Vec<_> = dir
        .read_dir()
        .ok()?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let name = path.file_stem()?.to_string_lossy();
            (name.contains(target_name) && path.extension() == Some("sauce".as_ref()))
                .then_some(format!("  - {}", path.display()))
        })
        .collect();

    (!matches.is_empty()).then(|| matches.join("\n"))
}

#[derive(clap::Parser)]
#[command(version, about = "Compiler for the Sauce language")]
pub struct Args {
    /// Input file to compile
    #[arg(
        required = true,
        value_parser = validate_sauce_file,
        value_name = "FILE[.sauce]"
    )]
    pub input: PathBuf,

    /// Output executable path
    #[arg(short, long, default_value = "app")]
    pub output: PathBuf,

    /// Keep the generated C file next to the executable
    #[arg(long)]
    pub keep_c: bool,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn process_build(
    input: PathBuf,
    output: PathBuf,
    keep_c: bool,
    verbose: bool,
) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read '{}'", input.display()))?;

    let mut files = Files::new();
    let file_id = files.add(input.display().to_string(), source);

    if verbose {
        println!("Compiling {}...", input.display());
    }

    let lexer = Lexer::new(&files, file_id);
    let mut parser = match Parser::new(lexer) {
        Ok(parser) => parser,
        Err(error) => {
            emit_diagnostic(&files, &error)?;
            return Err(anyhow!("Lexing failed"));
        }
    };

    let program = match parser.parse() {
        Ok(program) => program,
        Err(error) => {
            emit_diagnostic(&files, &error)?;
            return Err(anyhow!("Parsing failed"));
        }
    };

    let mut resolver = Resolver::new(&program, file_id);
    if let Err(error) = resolver.resolve() {
        emit_diagnostic(&files, &error)?;
        return Err(anyhow!("Semantic analysis failed"));
    }

    let c_file = output.with_extension("c");
    let mut target = Target::create(&resolver, file_id);
    if let Err(error) = target.compile(&program, &c_file) {
        emit_diagnostic(&files, &error.to_diagnostic())?;
        return Err(anyhow!("Code generation failed"));
    }

    if verbose {
        println!("Generated {}", c_file.display());
    }

    let run_cc = |compiler: &str| {
        Command::new(compiler)
            .args(["-std=c11", "-Wall", "-Wextra", "-O2"])
            .arg(&c_file)
            .arg("-o")
            .arg(&output)
            .status()
    };
    let status = run_cc("cc")
        .or_else(|_| run_cc("gcc"))
        .context("Failed to execute C compiler (tried cc and gcc)")?;

    if !status.success() {
        return Err(anyhow!("C compilation failed with status: {}", status));
    }

    if !keep_c {
        let _ = std::fs::remove_file(&c_file);
    }

    println!("Success! Executable '{}' created.", output.display());
    Ok(())
}
