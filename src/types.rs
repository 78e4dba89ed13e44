// ABOUTME: The type universe, variable store and unification

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

/// A type in the inference universe. Variables carry only their name;
/// what a variable stands for lives in the [`VarStore`], so types stay
/// cheap to clone and share.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// The dynamic/tagged type; unifies with anything.
    Any,
    Int,
    Bool,
    Symbol,
    Str,
    Void,
    Func(Rc<FuncType>),
    /// Zero or more of the inner type; only valid as the last element of
    /// a function's argument list.
    Variadic(Rc<Type>),
    Pair(Rc<PairType>),
    Var(Rc<str>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncType {
    pub args: Vec<Type>,
    pub result: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairType {
    pub car: Type,
    pub cdr: Type,
}

impl Type {
    pub fn func(args: Vec<Type>, result: Type) -> Type {
        Type::Func(Rc::new(FuncType { args, result }))
    }

    pub fn variadic(inner: Type) -> Type {
        Type::Variadic(Rc::new(inner))
    }

    pub fn pair(car: Type, cdr: Type) -> Type {
        Type::Pair(Rc::new(PairType { car, cdr }))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => write!(f, "Any"),
            Type::Int => write!(f, "Int"),
            Type::Bool => write!(f, "Bool"),
            Type::Symbol => write!(f, "Symbol"),
            Type::Str => write!(f, "String"),
            Type::Void => write!(f, "Void"),
            Type::Func(func) => {
                let args: Vec<String> = func.args.iter().map(|a| a.to_string()).collect();
                write!(f, "({}) -> {}", args.join(","), func.result)
            }
            Type::Variadic(inner) => write!(f, "{}...", inner),
            Type::Pair(p) => write!(f, "({} . {})", p.car, p.cdr),
            Type::Var(name) => write!(f, "TV({})", name),
        }
    }
}

#[derive(Error, Debug, Clone)]
#[error("cannot unify {left} with {right}")]
pub struct UnifyError {
    pub left: String,
    pub right: String,
}

/// The substitution store backing type variables: a fresh-name counter
/// plus the recorded `var -> type` bindings. Threaded through inference as
/// an explicit context, so independent programs can infer independently.
#[derive(Debug, Default)]
pub struct VarStore {
    next: usize,
    bindings: HashMap<Rc<str>, Type>,
}

impl VarStore {
    pub fn new() -> Self {
        VarStore::default()
    }

    /// A fresh, unbound variable. Names run a, b, ..., z, aa, ab, ...
    pub fn fresh(&mut self) -> Type {
        let name = var_name(self.next);
        self.next += 1;
        Type::Var(name.into())
    }

    /// The number of recorded substitutions. A full inference pass that
    /// adds none has reached the fixpoint.
    pub fn bindings_len(&self) -> usize {
        self.bindings.len()
    }

    /// Follow a variable chain to its representative: the first concrete
    /// type, or the terminal unbound variable.
    fn representative(&self, t: &Type) -> Type {
        let mut current = t.clone();
        while let Type::Var(name) = &current {
            match self.bindings.get(name) {
                Some(next) => current = next.clone(),
                None => break,
            }
        }
        current
    }

    /// Deeply substitute every resolved variable, for display and for the
    /// code emitter.
    pub fn resolve(&self, t: &Type) -> Type {
        match self.representative(t) {
            Type::Func(func) => Type::func(
                func.args.iter().map(|a| self.resolve(a)).collect(),
                self.resolve(&func.result),
            ),
            Type::Variadic(inner) => Type::variadic(self.resolve(&inner)),
            Type::Pair(p) => Type::pair(self.resolve(&p.car), self.resolve(&p.cdr)),
            other => other,
        }
    }

    /// Make two types equal, recording substitutions as needed.
    pub fn unify(&mut self, a: &Type, b: &Type) -> Result<(), UnifyError> {
        let ra = self.representative(a);
        let rb = self.representative(b);
        match (&ra, &rb) {
            (Type::Var(x), Type::Var(y)) if x == y => Ok(()),
            (Type::Var(x), _) => {
                self.bind(x.clone(), rb.clone());
                Ok(())
            }
            (_, Type::Var(y)) => {
                self.bind(y.clone(), ra.clone());
                Ok(())
            }
            (Type::Any, _) | (_, Type::Any) => Ok(()),
            (Type::Int, Type::Int)
            | (Type::Bool, Type::Bool)
            | (Type::Symbol, Type::Symbol)
            | (Type::Str, Type::Str)
            | (Type::Void, Type::Void) => Ok(()),
            (Type::Variadic(t), Type::Variadic(u)) => self.unify(t, u),
            (Type::Pair(p), Type::Pair(q)) => {
                self.unify(&p.car, &q.car)?;
                self.unify(&p.cdr, &q.cdr)
            }
            (Type::Func(f), Type::Func(g)) => self.unify_funcs(f, g),
            _ => Err(self.mismatch(&ra, &rb)),
        }
    }

    fn bind(&mut self, name: Rc<str>, t: Type) {
        // `representative` only ever returns unbound variables.
        debug_assert!(
            !self.bindings.contains_key(&name),
            "binding over a resolved variable"
        );
        self.bindings.insert(name, t);
    }

    /// Results always unify. Matching arities unify pairwise; otherwise
    /// the shorter side must end in a variadic whose inner type absorbs
    /// the longer side's extra arguments.
    fn unify_funcs(&mut self, f: &FuncType, g: &FuncType) -> Result<(), UnifyError> {
        self.unify(&f.result, &g.result)?;
        if f.args.len() == g.args.len() {
            for (a, b) in f.args.iter().zip(g.args.iter()) {
                self.unify(a, b)?;
            }
            return Ok(());
        }
        let (short, long) = if f.args.len() < g.args.len() {
            (f, g)
        } else {
            (g, f)
        };
        let Some((last, prefix)) = short.args.split_last() else {
            return Err(self.func_mismatch(f, g));
        };
        let Type::Variadic(inner) = self.representative(last) else {
            return Err(self.func_mismatch(f, g));
        };
        for (a, b) in prefix.iter().zip(long.args.iter()) {
            self.unify(a, b)?;
        }
        for extra in &long.args[prefix.len()..] {
            self.unify(extra, &inner)?;
        }
        Ok(())
    }

    fn mismatch(&self, a: &Type, b: &Type) -> UnifyError {
        UnifyError {
            left: self.resolve(a).to_string(),
            right: self.resolve(b).to_string(),
        }
    }

    fn func_mismatch(&self, f: &FuncType, g: &FuncType) -> UnifyError {
        self.mismatch(
            &Type::Func(Rc::new(f.clone())),
            &Type::Func(Rc::new(g.clone())),
        )
    }
}

/// Bijective base-26 variable names.
fn var_name(n: usize) -> String {
    let mut n = n + 1;
    let mut buf = Vec::new();
    while n > 0 {
        let m = n % 26;
        if m == 0 {
            buf.insert(0, b'z');
            n = n / 26 - 1;
        } else {
            buf.insert(0, b'a' + (m as u8) - 1);
            n /= 26;
        }
    }
    String::from_utf8(buf).expect("variable names are ascii")
}

/// The type environment: a stack of shared frames mirroring the value
/// environment, innermost first.
#[derive(Debug, Clone)]
pub struct TypeEnv {
    frames: Vec<Rc<RefCell<HashMap<String, Type>>>>,
}

impl Default for TypeEnv {
    fn default() -> Self {
        TypeEnv::new()
    }
}

impl TypeEnv {
    pub fn new() -> Self {
        TypeEnv {
            frames: vec![Rc::new(RefCell::new(HashMap::new()))],
        }
    }

    pub fn with_frame(&self, frame: HashMap<String, Type>) -> TypeEnv {
        let mut frames = Vec::with_capacity(self.frames.len() + 1);
        frames.push(Rc::new(RefCell::new(frame)));
        frames.extend(self.frames.iter().cloned());
        TypeEnv { frames }
    }

    pub fn lookup(&self, name: &str) -> Option<Type> {
        for frame in &self.frames {
            if let Some(t) = frame.borrow().get(name) {
                return Some(t.clone());
            }
        }
        None
    }

    /// Record a binding in the outermost frame, as `define` does for
    /// values.
    pub fn add_top_level(&self, name: String, t: Type) {
        self.frames
            .last()
            .expect("type environment always has a top-level frame")
            .borrow_mut()
            .insert(name, t);
    }
}
