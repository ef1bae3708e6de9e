/// Behaviours that differ between historical CHIP-8 interpreters.
///
/// The defaults match the original COSMAC VIP interpreter, which is what most
/// programs written for the plain CHIP-8 instruction set expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    /// 8XY1/8XY2/8XY3 zero VF
    pub logic_resets_vf: bool,
    /// 8XY6/8XYE shift VY into VX; otherwise VX is shifted in place
    pub shift_uses_vy: bool,
    /// BNNN jumps to NNN + VX (X being the top nibble of NNN) instead of NNN + V0
    pub jump_uses_vx: bool,
    /// FX55/FX65 leave I pointing just past the last register transferred
    pub memory_increments_i: bool,
}

impl Quirks {
    /// COSMAC VIP behaviour
    pub fn vip() -> Self {
        Quirks {
            logic_resets_vf: true,
            shift_uses_vy: true,
            jump_uses_vx: false,
            memory_increments_i: true,
        }
    }

    /// what many later interpreters (and a lot of newer programs) assume
    pub fn modern() -> Self {
        Quirks {
            logic_resets_vf: false,
            shift_uses_vy: false,
            jump_uses_vx: false,
            memory_increments_i: false,
        }
    }
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks::vip()
    }
}
