// ABOUTME: Code emitter skeleton lowering an inferred program to Rust source text

use std::fmt::Write as _;

use log::debug;

use crate::error::{Error, NodeError};
use crate::infer::infer_types;
use crate::interp::parse_source;
use crate::node::{Kind, Node, Progn};
use crate::types::{Type, VarStore};

/// Compile `source` to Rust program text: parse, infer, emit. The caller
/// decides where the generated source goes.
pub fn compile_source(file: &str, source: &str) -> Result<String, Error> {
    let tree = parse_source(file, source)?;
    let vars = infer_types(&tree).map_err(Error::Infer)?;
    debug!("inference finished for {file}");
    RustBackend::new(tree, vars).emit().map_err(Error::Infer)
}

/// Emits a `main` that calls one generated function per top-level form,
/// then stacks the function definitions after it. Bodies are stubs; the
/// interesting part is the inferred type surface on each signature.
pub struct RustBackend {
    tree: Node,
    vars: VarStore,
    fn_index: usize,
    fn_defs: Vec<String>,
}

impl RustBackend {
    pub fn new(tree: Node, vars: VarStore) -> Self {
        RustBackend {
            tree,
            vars,
            fn_index: 0,
            fn_defs: Vec::new(),
        }
    }

    fn next_function_name(&mut self) -> String {
        self.fn_index += 1;
        format!("form{}", self.fn_index)
    }

    pub fn emit(&mut self) -> Result<String, NodeError> {
        let progn = match self.tree.kind() {
            Kind::Progn(progn) => progn.clone(),
            _ => {
                return Err(NodeError::new(
                    &self.tree,
                    "program root is not a sequence",
                ))
            }
        };
        let mut out = String::new();
        out.push_str("fn main() {\n");
        self.emit_progn(&progn, &mut out)?;
        out.push_str("}\n");
        for def in &self.fn_defs {
            out.push('\n');
            out.push_str(def);
        }
        Ok(out)
    }

    fn emit_progn(&mut self, progn: &Progn, out: &mut String) -> Result<(), NodeError> {
        for child in progn.body.iter() {
            let name = self.next_function_name();
            let handle = child.type_handle(&mut self.vars);
            let surface = rust_type(&self.vars.resolve(&handle), &child)?;
            writeln!(out, "    {name}();").expect("writing to a string");
            self.fn_defs.push(format!(
                "// `{}`\nfn {}() -> {} {{\n    todo!()\n}}\n",
                child.to_string().replace('\n', "\\n"),
                name,
                surface,
            ));
        }
        Ok(())
    }
}

/// The Rust surface of a resolved type. This mapping is the only
/// knowledge the core shares with the emitter.
pub fn rust_type(t: &Type, node: &Node) -> Result<String, NodeError> {
    Ok(match t {
        Type::Int => "i64".to_string(),
        Type::Bool => "bool".to_string(),
        Type::Symbol | Type::Str => "String".to_string(),
        Type::Void => "()".to_string(),
        Type::Any => "Box<dyn std::any::Any>".to_string(),
        Type::Func(func) => {
            let args = func
                .args
                .iter()
                .map(|a| rust_type(a, node))
                .collect::<Result<Vec<_>, _>>()?
                .join(", ");
            format!("fn({}) -> {}", args, rust_type(&func.result, node)?)
        }
        Type::Variadic(inner) => format!("&[{}]", rust_type(inner, node)?),
        Type::Pair(p) => format!(
            "({}, {})",
            rust_type(&p.car, node)?,
            rust_type(&p.cdr, node)?
        ),
        Type::Var(name) => {
            return Err(NodeError::new(
                node,
                format!("type variable {name} was never resolved"),
            ))
        }
    })
}
