use codespan::{FileId, Files};
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

pub fn emit_diagnostic(
    files: &Files<String>,
    diagnostic: &Diagnostic<FileId>,
) -> anyhow::Result<()> {
    let writer = StandardStream::stderr(ColorChoice::Auto);
    let config = term::Config::default();

    term::emit(&mut writer.lock(), &config, files, diagnostic)?;
    Ok(())
}
