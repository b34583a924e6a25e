mod c;
mod compile_error;

pub use c::CBackend;
pub use compile_error::CompileError;

use crate::typeck::Resolver;
use codespan::FileId;
use std::path::Path;

pub enum Target<'a> {
    Native(c::CBackend<'a>),
}

impl<'a> Target<'a> {
    pub fn create(resolver: &'a Resolver<'a>, file_id: FileId) -> Self {
        Target::Native(c::CBackend::new(resolver, file_id))
    }

    pub fn compile(
        &mut self,
        program: &crate::ast::Program,
        output_path: &Path,
    ) -> Result<(), CompileError> {
        match self {
            Target::Native(c_backend) => c_backend.compile(program, output_path),
        }
    }
}
