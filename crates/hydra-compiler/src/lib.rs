// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # hydra-compiler
//!
//! Lowers ESTree syntax trees into Hydra IR and encodes the result as a
//! HYIR bytecode module.
//!
//! ## Architecture
//!
//! - **AST**: the closed ESTree node model, deserialized from JSON
//! - **Compiler**: scope resolution and lowering into basic blocks
//! - **IR**: modules, functions, blocks and instructions, with a text dump
//! - **Bytecode**: the binary writer, string pool and module container
//!
//! ## Example
//!
//! ```no_run
//! use hydra_compiler::{compile_json, FunctionIds};
//!
//! let ids = FunctionIds::new();
//! let tree = std::fs::read_to_string("main.json").unwrap();
//! let module = compile_json(&tree, "main.js", &ids).unwrap();
//! println!("{module}");
//! module.dump().unwrap().store("main.ir").unwrap();
//! ```

#![warn(missing_docs)]

pub mod ast;
pub mod bytecode;
pub mod compiler;
pub mod error;
pub mod ir;

pub use compiler::{Compiler, compile};
pub use error::{Error, ErrorCategory, Result};
pub use ir::{FunctionIds, IrModule};

/// Parses an ESTree JSON document and compiles it into a module.
pub fn compile_json(source: &str, name: &str, ids: &FunctionIds) -> Result<IrModule> {
    let program: ast::Program = serde_json::from_str(source)?;
    compile(&program, name, ids)
}
