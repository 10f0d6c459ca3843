//! A small Hack CPU used by the tests to execute translated programs.
//!
//! Assembles the emitted text with the standard predefined symbols, binds
//! labels in a first pass and allocates variables from address 16 on first
//! use, then steps instructions until the program counter leaves the ROM or
//! the step budget runs out.

use std::collections::HashMap;

const RAM_SIZE: usize = 1 << 16;
const FIRST_VARIABLE: u16 = 16;

#[derive(Debug)]
enum Instruction {
    Address(u16),
    Compute {
        dest: String,
        comp: String,
        jump: Option<String>,
    },
}

pub struct Cpu {
    rom: Vec<Instruction>,
    symbols: HashMap<String, u16>,
    pub ram: Vec<i16>,
    a: i16,
    d: i16,
    pc: usize,
}

fn predefined() -> HashMap<String, u16> {
    let mut symbols: HashMap<String, u16> = [
        ("SP", 0),
        ("LCL", 1),
        ("ARG", 2),
        ("THIS", 3),
        ("THAT", 4),
        ("SCREEN", 0x4000),
        ("KBD", 0x6000),
    ]
    .into_iter()
    .map(|(name, addr)| (name.to_string(), addr))
    .collect();
    for r in 0..16 {
        symbols.insert(format!("R{}", r), r);
    }
    symbols
}

fn strip(line: &str) -> &str {
    line.split_once("//").map(|(s, _)| s).unwrap_or(line).trim()
}

fn operand(c: char, a: i16, d: i16, m: i16) -> i16 {
    match c {
        'A' => a,
        'D' => d,
        'M' => m,
        '0' => 0,
        '1' => 1,
        _ => panic!("bad operand {}", c),
    }
}

fn eval(comp: &str, a: i16, d: i16, m: i16) -> i16 {
    let chars: Vec<char> = comp.chars().collect();
    let v = |c: char| operand(c, a, d, m);
    match chars.as_slice() {
        [x] => v(*x),
        ['-', x] => v(*x).wrapping_neg(),
        ['!', x] => !v(*x),
        [x, '+', y] => v(*x).wrapping_add(v(*y)),
        [x, '-', y] => v(*x).wrapping_sub(v(*y)),
        [x, '&', y] => v(*x) & v(*y),
        [x, '|', y] => v(*x) | v(*y),
        _ => panic!("unsupported comp {}", comp),
    }
}

fn jumps(jump: &str, value: i16) -> bool {
    match jump {
        "JGT" => value > 0,
        "JEQ" => value == 0,
        "JGE" => value >= 0,
        "JLT" => value < 0,
        "JNE" => value != 0,
        "JLE" => value <= 0,
        "JMP" => true,
        _ => panic!("bad jump {}", jump),
    }
}

impl Cpu {
    pub fn load(lines: &[String]) -> Self {
        let mut symbols = predefined();

        let mut address = 0;
        for line in lines.iter().map(|l| strip(l)).filter(|l| !l.is_empty()) {
            match line.strip_prefix('(').and_then(|l| l.strip_suffix(')')) {
                Some(label) => {
                    assert!(
                        symbols.insert(label.to_string(), address).is_none(),
                        "label {} defined twice",
                        label
                    );
                }
                None => address += 1,
            }
        }

        let mut next_variable = FIRST_VARIABLE;
        let mut rom = vec![];
        for line in lines.iter().map(|l| strip(l)).filter(|l| !l.is_empty()) {
            if line.starts_with('(') {
                continue;
            }
            let instruction = match line.strip_prefix('@') {
                Some(sym) => Instruction::Address(match sym.parse() {
                    Ok(value) => value,
                    Err(_) => *symbols.entry(sym.to_string()).or_insert_with(|| {
                        next_variable += 1;
                        next_variable - 1
                    }),
                }),
                None => {
                    let (rest, jump) = match line.split_once(';') {
                        Some((rest, jump)) => (rest, Some(jump.to_string())),
                        None => (line, None),
                    };
                    let (dest, comp) = rest.split_once('=').unwrap_or(("", rest));
                    Instruction::Compute {
                        dest: dest.to_string(),
                        comp: comp.to_string(),
                        jump,
                    }
                }
            };
            rom.push(instruction);
        }

        Cpu {
            rom,
            symbols,
            ram: vec![0; RAM_SIZE],
            a: 0,
            d: 0,
            pc: 0,
        }
    }

    /// Runs until the program counter leaves the ROM or `max_steps` is hit.
    pub fn run(&mut self, max_steps: usize) {
        for _ in 0..max_steps {
            if self.pc >= self.rom.len() {
                return;
            }
            self.step();
        }
    }

    fn step(&mut self) {
        match &self.rom[self.pc] {
            Instruction::Address(value) => {
                self.a = *value as i16;
                self.pc += 1;
            }
            Instruction::Compute { dest, comp, jump } => {
                let address = self.a as u16 as usize;
                let value = eval(comp, self.a, self.d, self.ram[address]);
                if dest.contains('M') {
                    self.ram[address] = value;
                }
                if dest.contains('D') {
                    self.d = value;
                }
                let target = self.a as u16 as usize;
                if dest.contains('A') {
                    self.a = value;
                }
                match jump {
                    Some(jump) if jumps(jump, value) => self.pc = target,
                    _ => self.pc += 1,
                }
            }
        }
    }

    pub fn symbol(&self, name: &str) -> Option<u16> {
        self.symbols.get(name).copied()
    }

    pub fn sp(&self) -> i16 {
        self.ram[0]
    }

    /// Value just below the stack pointer.
    pub fn top(&self) -> i16 {
        self.ram[self.sp() as usize - 1]
    }
}

#[test]
fn test_cpu_runs_hack() {
    let program: Vec<String> = ["@2", "D=A", "@3", "D=D+A", "@0", "M=D", "(END)", "@END", "0;JMP"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut cpu = Cpu::load(&program);
    cpu.run(100);
    assert_eq!(cpu.ram[0], 5);
    assert_eq!(cpu.symbol("END"), Some(6));
}
