use std::fmt;

/// Levels of indirection a declaration may carry. The registry grammar never nests deeper than
/// two.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PointerDepth {
    #[default]
    Zero,
    One,
    Two,
}

impl PointerDepth {
    pub const fn count(self) -> usize {
        match self {
            Self::Zero => 0,
            Self::One => 1,
            Self::Two => 2,
        }
    }

    pub const fn is_pointer(self) -> bool {
        !matches!(self, Self::Zero)
    }
}

impl TryFrom<usize> for PointerDepth {
    type Error = usize;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Zero),
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            n => Err(n),
        }
    }
}

/// A source type exactly as declared, e.g. `const GLfloat *`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    base_name: String,
    is_const: bool,
    pointer_depth: PointerDepth,
}

impl TypeDescriptor {
    pub fn new(base_name: impl Into<String>, is_const: bool, pointer_depth: PointerDepth) -> Self {
        Self {
            base_name: base_name.into(),
            is_const,
            pointer_depth,
        }
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn is_const(&self) -> bool {
        self.is_const
    }

    pub fn pointer_depth(&self) -> PointerDepth {
        self.pointer_depth
    }

    /// `void` (or its `GLvoid` alias) without indirection, i.e. "returns nothing".
    pub fn is_void(&self) -> bool {
        matches!(self.base_name.as_str(), "void" | "GLvoid") && !self.pointer_depth.is_pointer()
    }

    /// The C declaration of `name` with this type, `const GLfloat *v`.
    pub fn declare(&self, name: &str) -> String {
        match self.pointer_depth {
            PointerDepth::Zero => format!("{self} {name}"),
            PointerDepth::One | PointerDepth::Two => format!("{self}{name}"),
        }
    }
}

/// Formats the C spelling, `const GLchar **` style.
impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            f.write_str("const ")?;
        }
        f.write_str(&self.base_name)?;
        match self.pointer_depth {
            PointerDepth::Zero => Ok(()),
            PointerDepth::One => f.write_str(" *"),
            PointerDepth::Two => f.write_str(" **"),
        }
    }
}

/// Parsed form of a parameter's `len` attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamLen {
    /// A fixed element count, `len="4"`.
    Count(u32),
    /// The length is held by another parameter, `len="count"`.
    ParamRef(String),
    /// The length is computed from other parameters, `len="COMPSIZE(format,type)"`.
    CompSize(String),
}

impl ParamLen {
    pub fn parse(len: &str) -> Self {
        if let Some(params) = len.strip_prefix("COMPSIZE(") {
            return Self::CompSize(params.strip_suffix(')').unwrap_or(params).to_string());
        }
        match len.parse() {
            Ok(count) => Self::Count(count),
            Err(_) => Self::ParamRef(len.to_string()),
        }
    }
}

impl fmt::Display for ParamLen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(count) => write!(f, "{count}"),
            Self::ParamRef(param) => f.write_str(param),
            Self::CompSize(params) => write!(f, "COMPSIZE({params})"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub type_: TypeDescriptor,
    pub group: Option<String>,
    pub len: Option<ParamLen>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSignature {
    /// De-prefixed name, `ClearColor` for `glClearColor`.
    pub name: String,
    /// The name as declared, which is what the platform loader resolves.
    pub entry_point: String,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeDescriptor,
}

impl CommandSignature {
    /// Every type that crosses the boundary, return type first.
    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        std::iter::once(&self.return_type).chain(self.parameters.iter().map(|p| &p.type_))
    }
}
