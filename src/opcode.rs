//! VM instruction set (subset emitted by this crate)

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// Push an empty array (also integer 0 / false)
    PUSH0 = 0x00,
    /// 0x01..=0x4B push the next N bytes; this is the lowest of that range
    PUSHBYTES1 = 0x01,
    PUSHBYTES33 = 0x21,
    PUSHBYTES64 = 0x40,
    PUSHBYTES75 = 0x4b,
    PUSHDATA1 = 0x4c,
    PUSHDATA2 = 0x4d,
    PUSHDATA4 = 0x4e,
    PUSHM1 = 0x4f,
    PUSH1 = 0x51,
    PUSH16 = 0x60,
    NOP = 0x61,
    RET = 0x66,
    APPCALL = 0x67,
    SYSCALL = 0x68,
    TAILCALL = 0x69,
    CHECKSIG = 0xac,
    CHECKMULTISIG = 0xae,
    PACK = 0xc1,
    THROWIFNOT = 0xf1,
}

impl OpCode {
    pub const PUSHT: OpCode = OpCode::PUSH1;
    pub const PUSHF: OpCode = OpCode::PUSH0;

    pub fn byte(self) -> u8 {
        self as u8
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> u8 {
        op as u8
    }
}
