//! Decoding FUNCTION sections back into tags and operands.

use super::Tag;
use crate::bytecode::{ModuleReader, SectionReader};
use crate::error::{Error, Result};
use std::fmt;

/// A decoded operand field.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Linear offset of another instruction
    Value(u32),
    /// Block index
    Block(u32),
    /// Function id
    Function(u32),
    /// Size, count or index immediate
    Immediate(u32),
    /// Number literal
    Number(f64),
    /// Resolved string-pool entry
    String(String),
}

/// A decoded instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedInst {
    /// Instruction tag
    pub tag: Tag,
    /// Operand fields, with list lengths folded away
    pub operands: Vec<Operand>,
}

/// A decoded function section.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFunction {
    /// Function name
    pub name: String,
    /// Declared parameter count
    pub param_count: u32,
    /// Instructions per block
    pub blocks: Vec<Vec<DecodedInst>>,
}

impl DecodedFunction {
    /// Decodes one FUNCTION section, resolving strings through `module`'s
    /// string pool and checking that every value and block reference
    /// stays inside the function.
    pub fn decode(section: &[u8], module: &ModuleReader<'_>) -> Result<Self> {
        let mut r = SectionReader::new(section);
        let name = module.string_at(r.uint()?)?;
        let param_count = r.uint()?;
        let block_count = r.uint()?;

        let mut blocks = Vec::with_capacity((block_count as usize).min(r.remaining() / 4));
        for _ in 0..block_count {
            let count = r.uint()?;
            let mut insts = Vec::with_capacity((count as usize).min(r.remaining() / 4));
            for _ in 0..count {
                let code = r.uint()?;
                let tag = Tag::try_from(code)
                    .map_err(|code| Error::InvalidModule(format!("unknown instruction tag {code}")))?;
                let operands = decode_operands(tag, &mut r, module)?;
                insts.push(DecodedInst { tag, operands });
            }
            blocks.push(insts);
        }
        if r.remaining() != 0 {
            return Err(Error::InvalidModule(format!(
                "{} trailing bytes after function {name:?}",
                r.remaining()
            )));
        }

        let decoded = Self {
            name,
            param_count,
            blocks,
        };
        decoded.check_references()?;
        Ok(decoded)
    }

    /// Total instruction count.
    pub fn inst_count(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }

    fn check_references(&self) -> Result<()> {
        let insts = self.inst_count() as u32;
        let blocks = self.blocks.len() as u32;
        for operand in self.blocks.iter().flatten().flat_map(|i| &i.operands) {
            match *operand {
                Operand::Value(v) if v >= insts => {
                    return Err(Error::InvalidModule(format!(
                        "operand {v} out of range in function {:?}",
                        self.name
                    )));
                }
                Operand::Block(b) if b >= blocks => {
                    return Err(Error::InvalidModule(format!(
                        "block {b} out of range in function {:?}",
                        self.name
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn decode_operands(
    tag: Tag,
    r: &mut SectionReader<'_>,
    module: &ModuleReader<'_>,
) -> Result<Vec<Operand>> {
    let mut ops = Vec::new();
    let value = |r: &mut SectionReader<'_>| r.uint().map(Operand::Value);
    match tag {
        Tag::Return | Tag::Load | Tag::Move | Tag::BNot | Tag::LNot | Tag::TypeOf | Tag::Neg => {
            ops.push(value(r)?);
        }
        Tag::Store
        | Tag::GetItem
        | Tag::DelItem
        | Tag::New
        | Tag::Add
        | Tag::Sub
        | Tag::Mul
        | Tag::Div
        | Tag::Mod
        | Tag::BAnd
        | Tag::BOr
        | Tag::BXor
        | Tag::Sll
        | Tag::Srl
        | Tag::Srr
        | Tag::Eq
        | Tag::Eqq
        | Tag::Ne
        | Tag::Nee
        | Tag::Gt
        | Tag::Ge
        | Tag::Lt
        | Tag::Le
        | Tag::In
        | Tag::InstanceOf => {
            ops.push(value(r)?);
            ops.push(value(r)?);
        }
        Tag::SetItem | Tag::Call => {
            ops.push(value(r)?);
            ops.push(value(r)?);
            ops.push(value(r)?);
        }
        Tag::Jump => ops.push(Operand::Block(r.uint()?)),
        Tag::Branch => {
            ops.push(value(r)?);
            ops.push(Operand::Block(r.uint()?));
            ops.push(Operand::Block(r.uint()?));
        }
        Tag::GetGlobal | Tag::String | Tag::Regex => {
            ops.push(Operand::String(module.string_at(r.uint()?)?));
        }
        Tag::Number => ops.push(Operand::Number(r.double()?)),
        Tag::Object => {
            let n = r.uint()?;
            for _ in 0..n {
                ops.push(value(r)?);
                ops.push(value(r)?);
            }
        }
        Tag::Array => {
            let n = r.uint()?;
            for _ in 0..n {
                ops.push(value(r)?);
            }
        }
        Tag::Func | Tag::Arrow | Tag::PushScope => {
            let head = r.uint()?;
            ops.push(if tag == Tag::PushScope {
                Operand::Immediate(head)
            } else {
                Operand::Function(head)
            });
            let n = r.uint()?;
            for _ in 0..n {
                ops.push(value(r)?);
            }
        }
        Tag::PopScope | Tag::Arg | Tag::Capture => ops.push(Operand::Immediate(r.uint()?)),
        Tag::Phi => {
            let n = r.uint()?;
            for _ in 0..n {
                ops.push(Operand::Block(r.uint()?));
                ops.push(value(r)?);
            }
        }
        Tag::Undefined
        | Tag::Null
        | Tag::True
        | Tag::False
        | Tag::Alloca
        | Tag::This
        | Tag::Arguments
        | Tag::Debugger => {}
    }
    Ok(ops)
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Value(v) => write!(f, "@{v}"),
            Operand::Block(b) => write!(f, "blk_{b}"),
            Operand::Function(id) => write!(f, "#{id}"),
            Operand::Immediate(n) => write!(f, "{n}"),
            Operand::Number(n) => write!(f, "{n}"),
            Operand::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl fmt::Display for DecodedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "function {:?} (params: {})", self.name, self.param_count)?;
        let mut offset = 0;
        for (index, block) in self.blocks.iter().enumerate() {
            writeln!(f, "  blk_{index}:")?;
            for inst in block {
                write!(f, "    @{offset} {}", inst.tag.mnemonic())?;
                for operand in &inst.operands {
                    write!(f, " {operand}")?;
                }
                writeln!(f)?;
                offset += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{BufferWriter, ByteCode, SectionType, StringPool};
    use crate::ir::{BinaryOp, FunctionIds, IrModule};

    #[test]
    fn test_decode_matches_encoded_function() {
        let mut module = IrModule::new("m", &FunctionIds::new());
        let id = module.new_func("main", 0);
        let f = &mut module[id];
        let entry = f.new_block();
        let exit = f.new_block();
        let mut b = f.at(entry);
        let a = b.number(2.0);
        let s = b.string("k");
        let obj = b.object(vec![(s, a)]);
        let sum = b.binary(BinaryOp::Add, a, a);
        b.branch(sum, exit, exit);
        let phi = f.at(exit).phi(vec![(entry, obj)]);
        f.at(exit).ret(phi);

        let bytes = module.dump().unwrap().to_bytes();
        let reader = ModuleReader::parse(&bytes).unwrap();
        let section = reader.functions().next().unwrap();
        let decoded = DecodedFunction::decode(section, &reader).unwrap();

        assert_eq!(decoded.name, "main");
        assert_eq!(decoded.blocks.len(), 2);
        assert_eq!(decoded.inst_count(), 7);
        let tags: Vec<Tag> = decoded.blocks[0].iter().map(|i| i.tag).collect();
        assert_eq!(tags, [Tag::Number, Tag::String, Tag::Object, Tag::Add, Tag::Branch]);
        assert_eq!(decoded.blocks[0][1].operands, [Operand::String("k".into())]);
        assert_eq!(
            decoded.blocks[0][2].operands,
            [Operand::Value(1), Operand::Value(0)]
        );
        assert_eq!(
            decoded.blocks[1][0].operands,
            [Operand::Block(0), Operand::Value(2)]
        );
        assert_eq!(decoded.blocks[1][1].operands, [Operand::Value(5)]);
    }

    #[test]
    fn test_rejects_oversized_block_count() {
        let mut pool = StringPool::new();
        let mut function = BufferWriter::new();
        function.uint(pool.get("main"));
        function.uint(0);
        function.uint(u32::MAX);

        let mut bytecode = ByteCode::new();
        bytecode.add_section(function, SectionType::Function);
        bytecode.add_section(pool.into_writer(), SectionType::StringPool);
        let bytes = bytecode.to_bytes();

        let reader = ModuleReader::parse(&bytes).unwrap();
        let section = reader.functions().next().unwrap();
        let err = DecodedFunction::decode(section, &reader).unwrap_err();
        assert!(matches!(err, Error::InvalidModule(_)));
    }
}
