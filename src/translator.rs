use crate::ast::{Command::*, Segment::*, *};

macro_rules! svec {
    ($($x:expr),* $(,)?) => (vec![$($x.to_string()),*]);
}

/// First address of the stack region.
const STACK_BASE: u16 = 256;
/// Base address of the temp segment (R5..R12).
const TEMP_BASE: u16 = 5;
/// Slots in a call frame: return address, LCL, ARG, THIS, THAT.
const FRAME_SIZE: u16 = 5;
/// Program entry point invoked by the bootstrap.
const ENTRY_FUNCTION: &str = "Sys.init";

const COMPARE_TRUE: &str = "JUMP_TRUE_";
const COMPARE_END: &str = "JUMP_END_";
const RETURN_LABEL: &str = "RETURN_";

fn at_c(arg: impl std::fmt::Display) -> String {
    format!("@{}", arg)
}

fn at_s(arg: &str) -> String {
    format!("@{}", arg)
}

fn def(label: &str) -> String {
    format!("({})", label)
}

fn base_register(seg: Segment) -> &'static str {
    match seg {
        Local => "LCL",
        Argument => "ARG",
        This => "THIS",
        _ => "THAT",
    }
}

fn pointer_register(arg: u16) -> &'static str {
    match arg {
        0 => "THIS",
        _ => "THAT",
    }
}

fn static_symbol(file: &str, arg: impl std::fmt::Display) -> String {
    format!("{}.{}", file, arg)
}

/// Stores D at the top of the stack and bumps SP.
fn push_d() -> Vec<String> {
    svec!["@SP", "A=M", "M=D", "@SP", "M=M+1"]
}

/// Decrements SP and loads the popped value into D.
fn pop_d() -> Vec<String> {
    svec!["@SP", "M=M-1", "A=M", "D=M"]
}

/// Pushes the value held by a named register.
fn push_register(register: &str) -> Vec<String> {
    let mut code = svec![at_s(register), "D=M"];
    code.extend(push_d());
    code
}

/// Pops into the address previously computed into D, going through R13.
fn pop_to_d_address() -> Vec<String> {
    let mut code = svec!["@R13", "M=D"];
    code.extend(pop_d());
    code.extend(svec!["@R13", "A=M", "M=D"]);
    code
}

/// Push microcode for the segments addressed as base + index
fn seg_push(base: &str, deref: char, arg: u16) -> Vec<String> {
    let mut code = svec![
        at_c(arg),
        "D=A",
        at_s(base),
        format!("A={}+D", deref), // A = base+arg
        "D=M"                      // D = value to push
    ];
    code.extend(push_d());
    code
}

fn seg_push_direct(symbol: &str) -> Vec<String> {
    push_register(symbol)
}

fn seg_pop(base: &str, deref: char, arg: u16) -> Vec<String> {
    let mut code = svec![at_c(arg), "D=A", at_s(base), format!("D={}+D", deref)];
    code.extend(pop_to_d_address());
    code
}

fn seg_pop_direct(symbol: &str) -> Vec<String> {
    let mut code = pop_d();
    code.extend(svec![at_s(symbol), "M=D"]);
    code
}

fn push_constant(arg: i32) -> Vec<String> {
    // The assembler has no negative immediates
    let mut code = if arg < 0 {
        svec![at_c(-arg), "D=-A"]
    } else {
        svec![at_c(arg), "D=A"]
    };
    code.extend(push_d());
    code
}

fn simple_un_op(op: char) -> Vec<String> {
    svec!["@SP", "A=M-1", format!("M={}M", op)]
}

// i.e. no conditions or jumps, just pop and run
fn simple_bin_op(op: char) -> Vec<String> {
    let mut code = pop_d(); // Right arg in D
    code.extend(svec![
        "@SP",
        "A=M-1",               // Looking at left arg, will overwrite
        format!("M=M{}D", op)  // Op and overwrite second element
    ]);
    code
}

/// Reads `*(frame - offset)` into `register`, the frame base being in R14.
fn restore(register: &str, offset: u16) -> Vec<String> {
    svec!["@R14", "D=M", at_c(offset), "A=D-A", "D=M", at_s(register), "M=D"]
}

/// Code generator for one translation run.
///
/// Owns the counters that keep comparison and return labels unique, and the
/// name of the enclosing function used to scope VM labels. A single
/// translator must be used for every file of a program so that the counters
/// never restart.
#[derive(Debug, Default)]
pub struct Translator {
    comparisons: usize,
    calls: usize,
    function: String,
    annotate: bool,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Precede each translated command with a `// <command>` line.
    pub fn annotated(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    /// Name of the most recently declared function.
    pub fn current_function(&self) -> &str {
        &self.function
    }

    fn next_comparison(&mut self) -> usize {
        self.comparisons += 1;
        self.comparisons
    }

    fn next_call(&mut self) -> usize {
        self.calls += 1;
        self.calls
    }

    /// Sets SP to the stack base and calls the entry function.
    pub fn bootstrap(&mut self) -> Vec<String> {
        let mut code = if self.annotate {
            svec!["// bootstrap"]
        } else {
            vec![]
        };
        code.extend(svec![at_c(STACK_BASE), "D=A", "@SP", "M=D"]);
        code.extend(self.call(ENTRY_FUNCTION, 0));
        code
    }

    /// Binds the translator to one source file, for static symbol naming.
    pub fn file<'t>(&'t mut self, name: &'t str) -> FileScope<'t> {
        FileScope {
            translator: self,
            file: name,
        }
    }

    fn push(&self, file: &str, segment: Segment, arg: i32) -> Vec<String> {
        // Only constants may be negative; the parser rejects the rest.
        let index = u16::try_from(arg).unwrap_or_default();
        match segment {
            Constant => push_constant(arg),
            Local | Argument | This | That => seg_push(base_register(segment), 'M', index),
            Temp => seg_push(&TEMP_BASE.to_string(), 'A', index),
            Pointer => seg_push_direct(pointer_register(index)),
            Static => seg_push_direct(&static_symbol(file, index)),
        }
    }

    fn pop(&self, file: &str, segment: Segment, arg: u16) -> Vec<String> {
        match segment {
            Local | Argument | This | That => seg_pop(base_register(segment), 'M', arg),
            Temp => seg_pop(&TEMP_BASE.to_string(), 'A', arg),
            Pointer => {
                let mut code = svec![at_s(pointer_register(arg)), "D=A"];
                code.extend(pop_to_d_address());
                code
            }
            Static => seg_pop_direct(&static_symbol(file, arg)),
            // Rejected by the parser; there is no cell to store into.
            Constant => pop_d(),
        }
    }

    fn arithmetic(&mut self, op: Operator) -> Vec<String> {
        match op {
            Operator::Add => simple_bin_op('+'),
            Operator::Sub => simple_bin_op('-'),
            Operator::And => simple_bin_op('&'),
            Operator::Or => simple_bin_op('|'),
            Operator::Neg => simple_un_op('-'),
            Operator::Not => simple_un_op('!'),
            Operator::Eq => self.compare("JEQ"),
            Operator::Gt => self.compare("JGT"),
            Operator::Lt => self.compare("JLT"),
        }
    }

    fn compare(&mut self, jump: &str) -> Vec<String> {
        let sym = self.next_comparison();
        let true_sym = format!("{}{}", COMPARE_TRUE, sym);
        let end_sym = format!("{}{}", COMPARE_END, sym);

        let mut code = pop_d(); // Right arg in D
        code.extend(svec![
            "@SP",
            "A=M-1",
            "D=M-D", // left - right
            at_s(&true_sym),
            format!("D;{}", jump),
            "@SP",
            "A=M-1",
            "M=0",
            at_s(&end_sym),
            "0;JMP",
            def(&true_sym),
            "@SP",
            "A=M-1",
            "M=-1",
            def(&end_sym)
        ]);
        code
    }

    /// Convert VM label to Hack ASM symbol - for consistency across instructions
    fn label_to_sym(&self, label: &str) -> String {
        format!("{}${}", self.function, label)
    }

    fn label(&self, label: &str) -> Vec<String> {
        svec![def(&self.label_to_sym(label))]
    }

    fn goto(&self, label: &str) -> Vec<String> {
        svec![
            at_s(&self.label_to_sym(label)),
            "0;JMP" // Unconditional jump
        ]
    }

    fn if_goto(&self, label: &str) -> Vec<String> {
        let mut code = pop_d(); // Stack popped into D
        code.extend(svec![
            at_s(&self.label_to_sym(label)),
            "D;JNE" // False is 0
        ]);
        code
    }

    fn call(&mut self, function: &str, args: u16) -> Vec<String> {
        let ret = format!("{}{}", RETURN_LABEL, self.next_call());

        let mut code = svec![at_s(&ret), "D=A"];
        code.extend(push_d());
        for register in ["LCL", "ARG", "THIS", "THAT"] {
            code.extend(push_register(register));
        }
        code.extend(svec![
            "@SP",
            "D=M",
            at_c(u32::from(args) + u32::from(FRAME_SIZE)),
            "D=D-A",
            "@ARG",
            "M=D", // ARG = SP - args - 5
            "@SP",
            "D=M",
            "@LCL",
            "M=D", // LCL = SP
            at_s(function),
            "0;JMP",
            def(&ret)
        ]);
        code
    }

    fn function(&mut self, name: &str, locals: u16) -> Vec<String> {
        self.function = name.to_string();

        let mut code = svec![def(name)];
        for _ in 0..locals {
            code.extend(svec!["@SP", "A=M", "M=0", "@SP", "M=M+1"]);
        }
        code
    }

    fn ret(&self) -> Vec<String> {
        let mut code = svec!["@LCL", "D=M", "@R14", "M=D"]; // R14 = frame
        // Fetch the return address before argument 0 is overwritten
        code.extend(restore("R15", FRAME_SIZE));
        code.extend(seg_pop(base_register(Argument), 'M', 0));
        code.extend(svec!["@ARG", "D=M", "@SP", "M=D+1"]);
        code.extend(restore("THAT", 1));
        code.extend(restore("THIS", 2));
        code.extend(restore("ARG", 3));
        code.extend(restore("LCL", 4));
        code.extend(svec!["@R15", "A=M", "0;JMP"]);
        code
    }

    fn translate(&mut self, file: &str, command: &Command) -> Vec<String> {
        let mut instructions = if self.annotate {
            svec![format!("// {}", command)]
        } else {
            vec![]
        };

        let translated = match command {
            Push(seg, arg) => self.push(file, *seg, *arg),
            Pop(seg, arg) => self.pop(file, *seg, *arg),
            Arithmetic(op) => self.arithmetic(*op),
            Label(sym) => self.label(sym),
            Goto(sym) => self.goto(sym),
            IfGoto(sym) => self.if_goto(sym),
            Function(name, locals) => self.function(name, *locals),
            Call(name, args) => self.call(name, *args),
            Return => self.ret(),
        };

        instructions.extend(translated);
        instructions
    }
}

/// A [`Translator`] bound to the file whose commands are being translated.
pub struct FileScope<'t> {
    translator: &'t mut Translator,
    file: &'t str,
}

impl FileScope<'_> {
    pub fn translate(&mut self, command: &Command) -> Vec<String> {
        self.translator.translate(self.file, command)
    }

    pub fn file(&self) -> &str {
        self.file
    }
}
