use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Segment {
    Constant,
    Local,
    Static,
    Argument,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    pub fn name(&self) -> &'static str {
        match self {
            Segment::Constant => "constant",
            Segment::Local => "local",
            Segment::Static => "static",
            Segment::Argument => "argument",
            Segment::This => "this",
            Segment::That => "that",
            Segment::Pointer => "pointer",
            Segment::Temp => "temp",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Operator {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl Operator {
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Add => "add",
            Operator::Sub => "sub",
            Operator::Neg => "neg",
            Operator::Eq => "eq",
            Operator::Gt => "gt",
            Operator::Lt => "lt",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
        }
    }
}

/// The tag of a [`Command`], without its operands.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CommandKind {
    Push,
    Pop,
    Arithmetic,
    Label,
    Goto,
    IfGoto,
    Function,
    Call,
    Return,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Command {
    // Stack Basics
    Push(Segment, i32),
    Pop(Segment, u16),
    Arithmetic(Operator),

    // Control
    Label(String),
    Goto(String),
    IfGoto(String),

    // Functions
    Function(String, u16),
    Call(String, u16),
    Return,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Push(..) => CommandKind::Push,
            Command::Pop(..) => CommandKind::Pop,
            Command::Arithmetic(_) => CommandKind::Arithmetic,
            Command::Label(_) => CommandKind::Label,
            Command::Goto(_) => CommandKind::Goto,
            Command::IfGoto(_) => CommandKind::IfGoto,
            Command::Function(..) => CommandKind::Function,
            Command::Call(..) => CommandKind::Call,
            Command::Return => CommandKind::Return,
        }
    }

    /// First operand: segment, label, function or operator name.
    pub fn arg1(&self) -> Option<&str> {
        match self {
            Command::Push(seg, _) | Command::Pop(seg, _) => Some(seg.name()),
            Command::Arithmetic(op) => Some(op.name()),
            Command::Label(sym) | Command::Goto(sym) | Command::IfGoto(sym) => Some(sym),
            Command::Function(name, _) | Command::Call(name, _) => Some(name),
            Command::Return => None,
        }
    }

    /// Second operand: segment index, local count or argument count.
    pub fn arg2(&self) -> Option<i32> {
        match self {
            Command::Push(_, index) => Some(*index),
            Command::Pop(_, index) => Some(i32::from(*index)),
            Command::Function(_, n) | Command::Call(_, n) => Some(i32::from(*n)),
            _ => None,
        }
    }
}

/// Renders the command back in VM syntax.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Push(seg, index) => write!(f, "push {} {}", seg.name(), index),
            Command::Pop(seg, index) => write!(f, "pop {} {}", seg.name(), index),
            Command::Arithmetic(op) => f.write_str(op.name()),
            Command::Label(sym) => write!(f, "label {}", sym),
            Command::Goto(sym) => write!(f, "goto {}", sym),
            Command::IfGoto(sym) => write!(f, "if-goto {}", sym),
            Command::Function(name, locals) => write!(f, "function {} {}", name, locals),
            Command::Call(name, args) => write!(f, "call {} {}", name, args),
            Command::Return => f.write_str("return"),
        }
    }
}
