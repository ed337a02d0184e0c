//! Register-bank access abstraction.
//!
//! Peripheral drivers never touch MMIO directly. They consume a
//! [`RegisterPort`]: read / write / read-modify-write on one of two
//! independently addressed banks.
//!
//! ```text
//! StreamController / I2sBlock (pcm-i2s)
//!         ↓ RegisterPort
//! RegisterCache<P>   (optional: caches non-volatile registers)
//!         ↓ RegisterPort
//! MMIO transport     (board crate)
//! ```
//!
//! Each bank is described by a [`RegmapConfig`] that classifies offsets as
//! *volatile* (hardware may change them, never served from cache) or
//! *precious* (reading has a side effect, e.g. popping a FIFO word, so
//! they must never be read speculatively).

use heapless::LinearMap;
use thiserror_no_std::Error;

// ── Banks ────────────────────────────────────────────────────────────────────

/// The two register banks of an audio serial peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bank {
    /// Peripheral control bank (control/status, FIFO, mode, format, DMA).
    Control,
    /// Clock-generator bank (clock control and divider).
    Clock,
}

// ── Port trait ───────────────────────────────────────────────────────────────

/// Register transport consumed by peripheral drivers.
///
/// Offsets are byte offsets within the bank. Implementations decide how
/// (or whether) values are cached.
pub trait RegisterPort {
    /// Transport error type
    type Error: core::fmt::Debug;

    /// Read a 32-bit register.
    fn read(&mut self, bank: Bank, offset: u32) -> Result<u32, Self::Error>;

    /// Write a 32-bit register.
    fn write(&mut self, bank: Bank, offset: u32, value: u32) -> Result<(), Self::Error>;

    /// Read-modify-write restricted to the bits in `mask`.
    ///
    /// The write is skipped when the masked update leaves the register
    /// unchanged.
    fn update_bits(
        &mut self,
        bank: Bank,
        offset: u32,
        mask: u32,
        value: u32,
    ) -> Result<(), Self::Error> {
        let old = self.read(bank, offset)?;
        let new = (old & !mask) | (value & mask);
        if new != old {
            self.write(bank, offset, new)?;
        }
        Ok(())
    }
}

impl<T: RegisterPort + ?Sized> RegisterPort for &mut T {
    type Error = T::Error;

    fn read(&mut self, bank: Bank, offset: u32) -> Result<u32, Self::Error> {
        (**self).read(bank, offset)
    }

    fn write(&mut self, bank: Bank, offset: u32, value: u32) -> Result<(), Self::Error> {
        (**self).write(bank, offset, value)
    }

    fn update_bits(
        &mut self,
        bank: Bank,
        offset: u32,
        mask: u32,
        value: u32,
    ) -> Result<(), Self::Error> {
        (**self).update_bits(bank, offset, mask, value)
    }
}

// ── Bank description ─────────────────────────────────────────────────────────

/// Static description of one register bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegmapConfig {
    /// Short bank name used in diagnostics.
    pub name: &'static str,
    /// Address stride in bytes; every valid offset is a multiple of it.
    pub stride: u32,
    /// Highest valid offset (inclusive).
    pub max_register: u32,
    /// Offsets whose value can change without a CPU write.
    pub volatile: &'static [u32],
    /// Offsets whose read has side effects.
    pub precious: &'static [u32],
}

impl RegmapConfig {
    /// Returns `true` if `offset` lies on the stride and within the bank.
    pub fn is_valid(&self, offset: u32) -> bool {
        offset <= self.max_register && offset.checked_rem(self.stride) == Some(0)
    }

    /// Returns `true` if `offset` must always be read from hardware.
    pub fn is_volatile(&self, offset: u32) -> bool {
        self.volatile.contains(&offset) || self.is_precious(offset)
    }

    /// Returns `true` if reading `offset` has a side effect.
    pub fn is_precious(&self, offset: u32) -> bool {
        self.precious.contains(&offset)
    }

    /// Iterate over every valid offset of the bank, in address order.
    pub fn offsets(&self) -> impl Iterator<Item = u32> + '_ {
        let stride = self.stride.max(1);
        (0..=self.max_register).step_by(stride as usize)
    }
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// Error returned by [`RegisterCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegmapError<E> {
    /// Offset is outside the bank or not aligned to its stride.
    #[error("register {offset:#x} is not addressable in the {bank:?} bank")]
    InvalidRegister {
        /// Bank addressed
        bank: Bank,
        /// Offending offset
        offset: u32,
    },
    /// A read-modify-write was attempted on a precious register.
    #[error("register {offset:#x} in the {bank:?} bank is precious")]
    PreciousRead {
        /// Bank addressed
        bank: Bank,
        /// Offending offset
        offset: u32,
    },
    /// Underlying transport failed.
    #[error("register transport error: {0:?}")]
    Bus(E),
}

// ── Cache ────────────────────────────────────────────────────────────────────

/// Maximum number of cached registers per bank.
pub const CACHE_SLOTS: usize = 16;

struct BankCache {
    config: &'static RegmapConfig,
    values: LinearMap<u32, u32, CACHE_SLOTS>,
}

impl BankCache {
    const fn new(config: &'static RegmapConfig) -> Self {
        Self {
            config,
            values: LinearMap::new(),
        }
    }

    fn remember(&mut self, offset: u32, value: u32) {
        if self.config.is_volatile(offset) {
            return;
        }
        // A full map just means the register is read through next time.
        let _ = self.values.insert(offset, value);
    }
}

/// Write-through register cache over a raw [`RegisterPort`].
///
/// Non-volatile registers are served from the cache once read or written;
/// volatile and precious registers always go to hardware. Read-modify-write
/// on a precious register is refused, since the implicit read would consume
/// data.
pub struct RegisterCache<P> {
    inner: P,
    control: BankCache,
    clock: BankCache,
}

impl<P: RegisterPort> RegisterCache<P> {
    /// Wrap `inner`, describing the control and clock banks.
    pub fn new(
        inner: P,
        control: &'static RegmapConfig,
        clock: &'static RegmapConfig,
    ) -> Self {
        Self {
            inner,
            control: BankCache::new(control),
            clock: BankCache::new(clock),
        }
    }

    /// Drop every cached value (e.g. after a peripheral reset).
    pub fn invalidate(&mut self) {
        self.control.values.clear();
        self.clock.values.clear();
    }

    /// Cached value of a register, without touching hardware.
    pub fn cached(&self, bank: Bank, offset: u32) -> Option<u32> {
        self.bank(bank).values.get(&offset).copied()
    }

    /// Read every non-precious register of `bank` into `out` (address order).
    ///
    /// Returns the number of registers written to `out`. Precious registers
    /// are skipped, never read.
    pub fn dump(&mut self, bank: Bank, out: &mut [(u32, u32)]) -> Result<usize, RegmapError<P::Error>> {
        let config = self.bank(bank).config;
        let mut count = 0usize;
        for (offset, slot) in config
            .offsets()
            .filter(|offset| !config.is_precious(*offset))
            .zip(out.iter_mut())
        {
            *slot = (offset, self.read(bank, offset)?);
            count = count.saturating_add(1);
        }
        Ok(count)
    }

    /// Release the wrapped port.
    pub fn into_inner(self) -> P {
        self.inner
    }

    fn bank(&self, bank: Bank) -> &BankCache {
        match bank {
            Bank::Control => &self.control,
            Bank::Clock => &self.clock,
        }
    }

    fn bank_mut(&mut self, bank: Bank) -> &mut BankCache {
        match bank {
            Bank::Control => &mut self.control,
            Bank::Clock => &mut self.clock,
        }
    }

    fn check(&self, bank: Bank, offset: u32) -> Result<(), RegmapError<P::Error>> {
        if self.bank(bank).config.is_valid(offset) {
            Ok(())
        } else {
            Err(RegmapError::InvalidRegister { bank, offset })
        }
    }
}

impl<P: RegisterPort> RegisterPort for RegisterCache<P> {
    type Error = RegmapError<P::Error>;

    fn read(&mut self, bank: Bank, offset: u32) -> Result<u32, Self::Error> {
        self.check(bank, offset)?;
        if let Some(value) = self.cached(bank, offset) {
            return Ok(value);
        }
        let value = self.inner.read(bank, offset).map_err(RegmapError::Bus)?;
        self.bank_mut(bank).remember(offset, value);
        Ok(value)
    }

    fn write(&mut self, bank: Bank, offset: u32, value: u32) -> Result<(), Self::Error> {
        self.check(bank, offset)?;
        self.inner
            .write(bank, offset, value)
            .map_err(RegmapError::Bus)?;
        self.bank_mut(bank).remember(offset, value);
        Ok(())
    }

    fn update_bits(
        &mut self,
        bank: Bank,
        offset: u32,
        mask: u32,
        value: u32,
    ) -> Result<(), Self::Error> {
        self.check(bank, offset)?;
        if self.bank(bank).config.is_precious(offset) {
            return Err(RegmapError::PreciousRead { bank, offset });
        }
        let old = self.read(bank, offset)?;
        let new = (old & !mask) | (value & mask);
        if new != old {
            self.write(bank, offset, new)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    static CONTROL: RegmapConfig = RegmapConfig {
        name: "ctl",
        stride: 4,
        max_register: 0x0c,
        volatile: &[0x00],
        precious: &[0x04],
    };

    static CLOCK: RegmapConfig = RegmapConfig {
        name: "clk",
        stride: 4,
        max_register: 0x04,
        volatile: &[],
        precious: &[],
    };

    /// Raw port backed by two small arrays; counts hardware reads.
    #[derive(Default)]
    struct Raw {
        control: [u32; 4],
        clock: [u32; 2],
        reads: usize,
    }

    impl RegisterPort for Raw {
        type Error = core::convert::Infallible;

        fn read(&mut self, bank: Bank, offset: u32) -> Result<u32, Self::Error> {
            self.reads += 1;
            let idx = (offset / 4) as usize;
            Ok(match bank {
                Bank::Control => self.control[idx],
                Bank::Clock => self.clock[idx],
            })
        }

        fn write(&mut self, bank: Bank, offset: u32, value: u32) -> Result<(), Self::Error> {
            let idx = (offset / 4) as usize;
            match bank {
                Bank::Control => self.control[idx] = value,
                Bank::Clock => self.clock[idx] = value,
            }
            Ok(())
        }
    }

    #[test]
    fn config_classifies_offsets() {
        assert!(CONTROL.is_valid(0x08));
        assert!(!CONTROL.is_valid(0x06), "misaligned offset");
        assert!(!CONTROL.is_valid(0x10), "beyond max_register");
        assert!(CONTROL.is_volatile(0x00));
        assert!(CONTROL.is_volatile(0x04), "precious implies volatile");
        assert!(!CONTROL.is_volatile(0x08));
    }

    #[test]
    fn offsets_walk_the_stride() {
        let all: std::vec::Vec<u32> = CONTROL.offsets().collect();
        assert_eq!(all, [0x00, 0x04, 0x08, 0x0c]);
    }

    #[test]
    fn non_volatile_reads_are_served_from_cache() {
        let mut cache = RegisterCache::new(Raw::default(), &CONTROL, &CLOCK);
        cache.write(Bank::Control, 0x08, 0xABCD).unwrap();
        assert_eq!(cache.read(Bank::Control, 0x08).unwrap(), 0xABCD);
        assert_eq!(cache.into_inner().reads, 0);
    }

    #[test]
    fn volatile_reads_always_hit_hardware() {
        let mut cache = RegisterCache::new(Raw::default(), &CONTROL, &CLOCK);
        cache.write(Bank::Control, 0x00, 1).unwrap();
        cache.read(Bank::Control, 0x00).unwrap();
        cache.read(Bank::Control, 0x00).unwrap();
        assert_eq!(cache.cached(Bank::Control, 0x00), None);
        assert_eq!(cache.into_inner().reads, 2);
    }

    #[test]
    fn update_bits_on_precious_register_is_refused() {
        let mut cache = RegisterCache::new(Raw::default(), &CONTROL, &CLOCK);
        let err = cache.update_bits(Bank::Control, 0x04, 1, 1).unwrap_err();
        assert_eq!(
            err,
            RegmapError::PreciousRead {
                bank: Bank::Control,
                offset: 0x04
            }
        );
    }

    #[test]
    fn dump_skips_precious_registers() {
        let mut cache = RegisterCache::new(Raw::default(), &CONTROL, &CLOCK);
        let mut out = [(0u32, 0u32); 8];
        let n = cache.dump(Bank::Control, &mut out).unwrap();
        assert_eq!(n, 3);
        assert!(out[..n].iter().all(|(offset, _)| *offset != 0x04));
    }

    #[test]
    fn invalid_offset_is_rejected_before_transport() {
        let mut cache = RegisterCache::new(Raw::default(), &CONTROL, &CLOCK);
        assert!(matches!(
            cache.write(Bank::Clock, 0x08, 0),
            Err(RegmapError::InvalidRegister { .. })
        ));
    }

    #[test]
    fn invalidate_forces_hardware_read() {
        let mut cache = RegisterCache::new(Raw::default(), &CONTROL, &CLOCK);
        cache.write(Bank::Clock, 0x04, 7).unwrap();
        cache.invalidate();
        assert_eq!(cache.read(Bank::Clock, 0x04).unwrap(), 7);
        assert_eq!(cache.into_inner().reads, 1);
    }

    #[test]
    fn default_update_bits_skips_unchanged_write() {
        struct CountingWrites(u32, usize);
        impl RegisterPort for CountingWrites {
            type Error = core::convert::Infallible;
            fn read(&mut self, _: Bank, _: u32) -> Result<u32, Self::Error> {
                Ok(self.0)
            }
            fn write(&mut self, _: Bank, _: u32, value: u32) -> Result<(), Self::Error> {
                self.0 = value;
                self.1 += 1;
                Ok(())
            }
        }
        let mut port = CountingWrites(0b1010, 0);
        port.update_bits(Bank::Control, 0, 0b0010, 0b0010).unwrap();
        assert_eq!(port.1, 0);
        port.update_bits(Bank::Control, 0, 0b0001, 0b0001).unwrap();
        assert_eq!((port.0, port.1), (0b1011, 1));
    }
}
