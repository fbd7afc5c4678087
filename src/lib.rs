pub mod compiler;
pub mod config;
pub mod error;
pub mod lexer {
    pub mod lex;
    pub mod util;
}
pub mod parser {
    pub mod ast;
    pub mod recursive_descent;
}
pub mod semantics {
    pub mod symtab;
    pub mod typechecker;
    pub mod visit;
}
pub mod codegen {
    pub mod emitter;
    pub mod gen;
}
pub mod machine {
    pub mod isa;
    pub mod sim;
}

pub use compiler::{compile, Compilation};
pub use config::{Stage, TraceOptions};
pub use error::{CompileError, CompileResult, Diagnostic, Diagnostics};
