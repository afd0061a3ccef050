//! # Conditional Execution
//!
//! Every 32-bit instruction carries a condition in bits 31-28 and is skipped
//! (costing only its fetch) when the CPSR flags do not satisfy it. In the
//! 16-bit set only the conditional branch carries one.
//!
//! ```text
//! ┌──────┬────────┬─────────────────────┬──────────────────┐
//! │ Code │ Suffix │ Meaning             │ Flags tested     │
//! ├──────┼────────┼─────────────────────┼──────────────────┤
//! │ 0000 │   EQ   │ Equal               │ Z=1              │
//! │ 0001 │   NE   │ Not equal           │ Z=0              │
//! │ 0010 │   CS   │ Unsigned >=         │ C=1              │
//! │ 0011 │   CC   │ Unsigned <          │ C=0              │
//! │ 0100 │   MI   │ Negative            │ N=1              │
//! │ 0101 │   PL   │ Positive or zero    │ N=0              │
//! │ 0110 │   VS   │ Overflow            │ V=1              │
//! │ 0111 │   VC   │ No overflow         │ V=0              │
//! │ 1000 │   HI   │ Unsigned >          │ C=1 and Z=0      │
//! │ 1001 │   LS   │ Unsigned <=         │ C=0 or Z=1       │
//! │ 1010 │   GE   │ Signed >=           │ N=V              │
//! │ 1011 │   LT   │ Signed <            │ N!=V             │
//! │ 1100 │   GT   │ Signed >            │ Z=0 and N=V      │
//! │ 1101 │   LE   │ Signed <=           │ Z=1 or N!=V      │
//! │ 1110 │   AL   │ Always              │                  │
//! │ 1111 │   NV   │ Never (reserved)    │                  │
//! └──────┴────────┴─────────────────────┴──────────────────┘
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum Condition {
    EQ = 0x0,
    NE = 0x1,
    CS = 0x2,
    CC = 0x3,
    MI = 0x4,
    PL = 0x5,
    VS = 0x6,
    VC = 0x7,
    HI = 0x8,
    LS = 0x9,
    GE = 0xA,
    LT = 0xB,
    GT = 0xC,
    LE = 0xD,
    AL = 0xE,
    NV = 0xF,
}

impl From<u8> for Condition {
    fn from(item: u8) -> Self {
        match item & 0xF {
            0x0 => Self::EQ,
            0x1 => Self::NE,
            0x2 => Self::CS,
            0x3 => Self::CC,
            0x4 => Self::MI,
            0x5 => Self::PL,
            0x6 => Self::VS,
            0x7 => Self::VC,
            0x8 => Self::HI,
            0x9 => Self::LS,
            0xA => Self::GE,
            0xB => Self::LT,
            0xC => Self::GT,
            0xD => Self::LE,
            0xE => Self::AL,
            _ => Self::NV,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // AL is the implicit suffix.
        let suffix = match self {
            Self::EQ => "EQ",
            Self::NE => "NE",
            Self::CS => "CS",
            Self::CC => "CC",
            Self::MI => "MI",
            Self::PL => "PL",
            Self::VS => "VS",
            Self::VC => "VC",
            Self::HI => "HI",
            Self::LS => "LS",
            Self::GE => "GE",
            Self::LT => "LT",
            Self::GT => "GT",
            Self::LE => "LE",
            Self::AL => "",
            Self::NV => "NV",
        };
        f.write_str(suffix)
    }
}
