//! Script opcodes as a closed enumeration.
//!
//! Every assigned byte maps to exactly one [`Opcode`]; the interpreter
//! dispatches on [`OpcodeCategory`] and then matches exhaustively inside each
//! category, so adding a variant without handling it does not compile.

macro_rules! define_opcodes {
    ($($variant:ident = $byte:literal, $name:literal;)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Opcode {
            /// Push the next `n` bytes, `n` in `1..=75`.
            PushBytes(u8),
            /// `OP_1` through `OP_16`.
            PushNum(u8),
            /// `OP_NOP1` through `OP_NOP10`.
            NopN(u8),
            $($variant,)*
        }

        impl Opcode {
            /// `None` for bytes with no assigned opcode.
            pub const fn from_byte(b: u8) -> Option<Opcode> {
                match b {
                    0x01..=0x4b => Some(Opcode::PushBytes(b)),
                    0x51..=0x60 => Some(Opcode::PushNum(b - 0x50)),
                    0xb0..=0xb9 => Some(Opcode::NopN(b - 0xaf)),
                    $($byte => Some(Opcode::$variant),)*
                    _ => None,
                }
            }

            pub const fn to_byte(self) -> u8 {
                match self {
                    Opcode::PushBytes(n) => n,
                    Opcode::PushNum(n) => 0x50u8.wrapping_add(n),
                    Opcode::NopN(n) => 0xafu8.wrapping_add(n),
                    $(Opcode::$variant => $byte,)*
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    Opcode::PushBytes(_) => "OP_PUSHBYTES",
                    Opcode::PushNum(n) => SMALL_INT_NAMES
                        .get((n as usize).wrapping_sub(1))
                        .copied()
                        .unwrap_or("OP_UNKNOWN"),
                    Opcode::NopN(n) => NOP_NAMES
                        .get((n as usize).wrapping_sub(1))
                        .copied()
                        .unwrap_or("OP_UNKNOWN"),
                    $(Opcode::$variant => $name,)*
                }
            }
        }
    };
}

const SMALL_INT_NAMES: [&str; 16] = [
    "OP_1", "OP_2", "OP_3", "OP_4", "OP_5", "OP_6", "OP_7", "OP_8", "OP_9", "OP_10", "OP_11",
    "OP_12", "OP_13", "OP_14", "OP_15", "OP_16",
];

const NOP_NAMES: [&str; 10] = [
    "OP_NOP1", "OP_NOP2", "OP_NOP3", "OP_NOP4", "OP_NOP5", "OP_NOP6", "OP_NOP7", "OP_NOP8",
    "OP_NOP9", "OP_NOP10",
];

define_opcodes! {
    Zero = 0x00, "OP_0";
    PushData1 = 0x4c, "OP_PUSHDATA1";
    PushData2 = 0x4d, "OP_PUSHDATA2";
    PushData4 = 0x4e, "OP_PUSHDATA4";
    OneNegate = 0x4f, "OP_1NEGATE";
    Reserved = 0x50, "OP_RESERVED";

    Nop = 0x61, "OP_NOP";
    Ver = 0x62, "OP_VER";
    If = 0x63, "OP_IF";
    NotIf = 0x64, "OP_NOTIF";
    VerIf = 0x65, "OP_VERIF";
    VerNotIf = 0x66, "OP_VERNOTIF";
    Else = 0x67, "OP_ELSE";
    EndIf = 0x68, "OP_ENDIF";
    Verify = 0x69, "OP_VERIFY";
    Return = 0x6a, "OP_RETURN";

    ToAltStack = 0x6b, "OP_TOALTSTACK";
    FromAltStack = 0x6c, "OP_FROMALTSTACK";
    TwoDrop = 0x6d, "OP_2DROP";
    TwoDup = 0x6e, "OP_2DUP";
    ThreeDup = 0x6f, "OP_3DUP";
    TwoOver = 0x70, "OP_2OVER";
    TwoRot = 0x71, "OP_2ROT";
    TwoSwap = 0x72, "OP_2SWAP";
    IfDup = 0x73, "OP_IFDUP";
    Depth = 0x74, "OP_DEPTH";
    Drop = 0x75, "OP_DROP";
    Dup = 0x76, "OP_DUP";
    Nip = 0x77, "OP_NIP";
    Over = 0x78, "OP_OVER";
    Pick = 0x79, "OP_PICK";
    Roll = 0x7a, "OP_ROLL";
    Rot = 0x7b, "OP_ROT";
    Swap = 0x7c, "OP_SWAP";
    Tuck = 0x7d, "OP_TUCK";

    Cat = 0x7e, "OP_CAT";
    Substr = 0x7f, "OP_SUBSTR";
    Left = 0x80, "OP_LEFT";
    Right = 0x81, "OP_RIGHT";
    Size = 0x82, "OP_SIZE";

    Invert = 0x83, "OP_INVERT";
    And = 0x84, "OP_AND";
    Or = 0x85, "OP_OR";
    Xor = 0x86, "OP_XOR";
    Equal = 0x87, "OP_EQUAL";
    EqualVerify = 0x88, "OP_EQUALVERIFY";
    Reserved1 = 0x89, "OP_RESERVED1";
    Reserved2 = 0x8a, "OP_RESERVED2";

    OneAdd = 0x8b, "OP_1ADD";
    OneSub = 0x8c, "OP_1SUB";
    TwoMul = 0x8d, "OP_2MUL";
    TwoDiv = 0x8e, "OP_2DIV";
    Negate = 0x8f, "OP_NEGATE";
    Abs = 0x90, "OP_ABS";
    Not = 0x91, "OP_NOT";
    ZeroNotEqual = 0x92, "OP_0NOTEQUAL";
    Add = 0x93, "OP_ADD";
    Sub = 0x94, "OP_SUB";
    Mul = 0x95, "OP_MUL";
    Div = 0x96, "OP_DIV";
    Mod = 0x97, "OP_MOD";
    LShift = 0x98, "OP_LSHIFT";
    RShift = 0x99, "OP_RSHIFT";
    BoolAnd = 0x9a, "OP_BOOLAND";
    BoolOr = 0x9b, "OP_BOOLOR";
    NumEqual = 0x9c, "OP_NUMEQUAL";
    NumEqualVerify = 0x9d, "OP_NUMEQUALVERIFY";
    NumNotEqual = 0x9e, "OP_NUMNOTEQUAL";
    LessThan = 0x9f, "OP_LESSTHAN";
    GreaterThan = 0xa0, "OP_GREATERTHAN";
    LessThanOrEqual = 0xa1, "OP_LESSTHANOREQUAL";
    GreaterThanOrEqual = 0xa2, "OP_GREATERTHANOREQUAL";
    Min = 0xa3, "OP_MIN";
    Max = 0xa4, "OP_MAX";
    Within = 0xa5, "OP_WITHIN";

    Ripemd160 = 0xa6, "OP_RIPEMD160";
    Sha1 = 0xa7, "OP_SHA1";
    Sha256 = 0xa8, "OP_SHA256";
    Hash160 = 0xa9, "OP_HASH160";
    Hash256 = 0xaa, "OP_HASH256";
    CodeSeparator = 0xab, "OP_CODESEPARATOR";
    CheckSig = 0xac, "OP_CHECKSIG";
    CheckSigVerify = 0xad, "OP_CHECKSIGVERIFY";
    CheckMultiSig = 0xae, "OP_CHECKMULTISIG";
    CheckMultiSigVerify = 0xaf, "OP_CHECKMULTISIGVERIFY";
}

/// Dispatch groups used by the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeCategory {
    Push,
    Flow,
    Stack,
    Equality,
    Numeric,
    Crypto,
    Disabled,
    Reserved,
    Nop,
}

impl Opcode {
    pub fn category(self) -> OpcodeCategory {
        use Opcode::*;
        match self {
            Zero | PushBytes(_) | PushData1 | PushData2 | PushData4 | OneNegate | PushNum(_) => {
                OpcodeCategory::Push
            }
            If | NotIf | Else | EndIf | Verify | Return => OpcodeCategory::Flow,
            ToAltStack | FromAltStack | TwoDrop | TwoDup | ThreeDup | TwoOver | TwoRot
            | TwoSwap | IfDup | Depth | Drop | Dup | Nip | Over | Pick | Roll | Rot | Swap
            | Tuck | Size => OpcodeCategory::Stack,
            Equal | EqualVerify => OpcodeCategory::Equality,
            OneAdd | OneSub | Negate | Abs | Not | ZeroNotEqual | Add | Sub | BoolAnd
            | BoolOr | NumEqual | NumEqualVerify | NumNotEqual | LessThan | GreaterThan
            | LessThanOrEqual | GreaterThanOrEqual | Min | Max | Within => {
                OpcodeCategory::Numeric
            }
            Ripemd160 | Sha1 | Sha256 | Hash160 | Hash256 | CodeSeparator | CheckSig
            | CheckSigVerify | CheckMultiSig | CheckMultiSigVerify => OpcodeCategory::Crypto,
            Cat | Substr | Left | Right | Invert | And | Or | Xor | TwoMul | TwoDiv | Mul
            | Div | Mod | LShift | RShift => OpcodeCategory::Disabled,
            Reserved | Ver | VerIf | VerNotIf | Reserved1 | Reserved2 => OpcodeCategory::Reserved,
            Nop | NopN(_) => OpcodeCategory::Nop,
        }
    }

    /// Push opcodes (up to and including `OP_16`) do not count towards the
    /// operation limit.
    pub fn is_push(self) -> bool {
        self.to_byte() <= 0x60
    }

    /// Opcodes that must be looked at even inside an untaken branch.
    pub fn is_conditional(self) -> bool {
        matches!(self, Opcode::If | Opcode::NotIf | Opcode::Else | Opcode::EndIf)
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Opcode::PushBytes(n) => write!(f, "OP_PUSHBYTES_{}", n),
            op => f.write_str(op.name()),
        }
    }
}
