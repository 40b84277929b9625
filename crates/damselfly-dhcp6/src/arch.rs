//! Client system architecture types.
//!
//! The RFC 4578 processor architecture registry, carried in DHCPv6 by the
//! client architecture type option (RFC 5970). The canonical names feed the
//! boot-URL payload so the boot target can pick matching artifacts.

/// A processor architecture type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientArch {
    IntelX86Pc,
    NecPc98,
    EfiItanium,
    DecAlpha,
    ArcX86,
    IntelLeanClient,
    EfiIa32,
    EfiBc,
    EfiXscale,
    EfiX86_64,
    EfiArm32,
    EfiArm64,
    Unknown(u16),
}

impl From<u16> for ClientArch {
    fn from(value: u16) -> Self {
        match value {
            0 => ClientArch::IntelX86Pc,
            1 => ClientArch::NecPc98,
            2 => ClientArch::EfiItanium,
            3 => ClientArch::DecAlpha,
            4 => ClientArch::ArcX86,
            5 => ClientArch::IntelLeanClient,
            6 => ClientArch::EfiIa32,
            7 => ClientArch::EfiBc,
            8 => ClientArch::EfiXscale,
            9 => ClientArch::EfiX86_64,
            10 => ClientArch::EfiArm32,
            11 => ClientArch::EfiArm64,
            other => ClientArch::Unknown(other),
        }
    }
}

impl ClientArch {
    /// The registry code, for re-encoding.
    pub fn code(&self) -> u16 {
        match self {
            ClientArch::IntelX86Pc => 0,
            ClientArch::NecPc98 => 1,
            ClientArch::EfiItanium => 2,
            ClientArch::DecAlpha => 3,
            ClientArch::ArcX86 => 4,
            ClientArch::IntelLeanClient => 5,
            ClientArch::EfiIa32 => 6,
            ClientArch::EfiBc => 7,
            ClientArch::EfiXscale => 8,
            ClientArch::EfiX86_64 => 9,
            ClientArch::EfiArm32 => 10,
            ClientArch::EfiArm64 => 11,
            ClientArch::Unknown(code) => *code,
        }
    }

    /// Canonical registry name, e.g. `EFI_X86_64`.
    pub fn name(&self) -> &'static str {
        match self {
            ClientArch::IntelX86Pc => "INTEL_X86PC",
            ClientArch::NecPc98 => "NEC_PC98",
            ClientArch::EfiItanium => "EFI_ITANIUM",
            ClientArch::DecAlpha => "DEC_ALPHA",
            ClientArch::ArcX86 => "ARC_X86",
            ClientArch::IntelLeanClient => "INTEL_LEAN_CLIENT",
            ClientArch::EfiIa32 => "EFI_IA32",
            ClientArch::EfiBc => "EFI_BC",
            ClientArch::EfiXscale => "EFI_XSCALE",
            ClientArch::EfiX86_64 => "EFI_X86_64",
            ClientArch::EfiArm32 => "EFI_ARM32",
            ClientArch::EfiArm64 => "EFI_ARM64",
            ClientArch::Unknown(_) => "UNKNOWN",
        }
    }
}
