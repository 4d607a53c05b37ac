use bitflags::bitflags;

bitflags! {
    /// Temporary per-actor status flags toggled by effects.
    ///
    /// Flags are independent bits; content decides which combinations are
    /// mutually exclusive.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct StateFlags: u8 {
        const PHASE         = 1 << 0;
        const BORROWED_TIME = 1 << 1;
        const TIME_DEBT     = 1 << 2;
        const GLASS_CANNON  = 1 << 3;
        const MELTDOWN      = 1 << 4;
    }
}
