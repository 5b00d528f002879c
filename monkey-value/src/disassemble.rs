use crate::code::{Instructions, OpCode};
use num_traits::FromPrimitive;
use std::fmt;

impl Instructions {
    /// Disassembles the instruction at the `offset`.
    fn disassemble_instr(
        &self,
        f: &mut fmt::Formatter<'_>,
        offset: usize,
    ) -> Result<usize, fmt::Error> {
        write!(f, "{:04} ", offset)?;

        match OpCode::from_u8(self.0[offset]) {
            Some(op) => {
                let (operands, read) = self.read_operands(op, offset + 1);
                match operands.as_slice() {
                    [] => writeln!(f, "{}", op.name())?,
                    [a] => writeln!(f, "{:<12} {}", op.name(), a)?,
                    [a, b] => writeln!(f, "{:<12} {} {}", op.name(), a, b)?,
                    _ => unreachable!(),
                }
                Ok(offset + 1 + read)
            }
            None => {
                // skip bad instruction
                writeln!(f, "invalid ({})", self.0[offset])?;
                Ok(offset + 1)
            }
        }
    }
}

impl fmt::Display for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut offset = 0;
        while offset < self.len() {
            offset = self.disassemble_instr(f, offset)?;
        }

        Ok(())
    }
}
