//! Integer bit-flag masks persisted for authorized and connected capabilities.

// std
use std::ops::{BitAnd, BitOr, BitOrAssign};
// self
use crate::{
	_prelude::*,
	capability::{Capability, StorageCapability},
	error::MalformedInputError,
};

/// Individual storage capability flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u32)]
pub enum CapabilityFlag {
	/// Maps to [`StorageCapability::ACCESS`].
	Access = 1,
	/// Maps to [`StorageCapability::BROWSE`].
	Browse = 1 << 1,
	/// Maps to [`StorageCapability::UPDATE`].
	Update = 1 << 2,
	/// Maps to [`StorageCapability::COMMIT`].
	Commit = 1 << 3,
}
impl CapabilityFlag {
	/// Every flag in bit order.
	pub const ALL: [CapabilityFlag; 4] = [Self::Access, Self::Browse, Self::Update, Self::Commit];

	/// Raw bit value.
	pub const fn bits(self) -> u32 {
		self as u32
	}

	/// Descriptor granted by the flag.
	pub const fn capability(self) -> Capability {
		match self {
			Self::Access => StorageCapability::ACCESS,
			Self::Browse => StorageCapability::BROWSE,
			Self::Update => StorageCapability::UPDATE,
			Self::Commit => StorageCapability::COMMIT,
		}
	}
}
impl BitOr for CapabilityFlag {
	type Output = CapabilityMask;

	fn bitor(self, rhs: Self) -> CapabilityMask {
		CapabilityMask::from(self) | rhs
	}
}

/// Storable combination of [`CapabilityFlag`] values.
///
/// Serializes as a bare integer. Deserialization rejects bits no flag defines.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CapabilityMask(u32);
impl CapabilityMask {
	/// Mask granting nothing.
	pub const EMPTY: Self = Self(0);

	const KNOWN_BITS: u32 = CapabilityFlag::Access.bits()
		| CapabilityFlag::Browse.bits()
		| CapabilityFlag::Update.bits()
		| CapabilityFlag::Commit.bits();

	/// Validates raw persisted bits.
	pub fn from_bits(bits: u32) -> Result<Self, MalformedInputError> {
		let unknown = bits & !Self::KNOWN_BITS;

		if unknown != 0 {
			return Err(MalformedInputError::UnknownCapabilityBits { bits: unknown });
		}

		Ok(Self(bits))
	}

	/// Raw bits for storage.
	pub const fn bits(self) -> u32 {
		self.0
	}

	/// Returns true when no flag is set.
	pub const fn is_empty(self) -> bool {
		self.0 == 0
	}

	/// Returns true when `flag` is granted.
	pub const fn contains(self, flag: CapabilityFlag) -> bool {
		self.0 & flag.bits() != 0
	}

	/// Returns true when every flag of `self` is also set in `other`.
	pub const fn is_subset_of(self, other: Self) -> bool {
		self.0 & !other.0 == 0
	}

	/// Flags set in the mask, in bit order.
	pub fn flags(self) -> impl Iterator<Item = CapabilityFlag> {
		CapabilityFlag::ALL.into_iter().filter(move |flag| self.contains(*flag))
	}

	/// Descriptors granted by the mask, in bit order.
	pub fn capabilities(self) -> impl Iterator<Item = Capability> {
		self.flags().map(CapabilityFlag::capability)
	}
}
impl From<CapabilityFlag> for CapabilityMask {
	fn from(flag: CapabilityFlag) -> Self {
		Self(flag.bits())
	}
}
impl TryFrom<u32> for CapabilityMask {
	type Error = MalformedInputError;

	fn try_from(bits: u32) -> Result<Self, Self::Error> {
		Self::from_bits(bits)
	}
}
impl From<CapabilityMask> for u32 {
	fn from(mask: CapabilityMask) -> Self {
		mask.0
	}
}
impl<T> BitOr<T> for CapabilityMask
where
	T: Into<CapabilityMask>,
{
	type Output = Self;

	fn bitor(self, rhs: T) -> Self {
		Self(self.0 | rhs.into().0)
	}
}
impl<T> BitOrAssign<T> for CapabilityMask
where
	T: Into<CapabilityMask>,
{
	fn bitor_assign(&mut self, rhs: T) {
		self.0 |= rhs.into().0;
	}
}
impl BitAnd for CapabilityMask {
	type Output = Self;

	fn bitand(self, rhs: Self) -> Self {
		Self(self.0 & rhs.0)
	}
}
impl Debug for CapabilityMask {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_set().entries(self.flags()).finish()
	}
}

/// Combines flag members with bitwise OR.
///
/// There is no implicit identity element: an empty input is rejected with
/// [`MalformedInputError::EmptyFlagSet`].
pub fn combine_flags<I, F>(members: I) -> Result<CapabilityMask, MalformedInputError>
where
	I: IntoIterator<Item = F>,
	F: Into<CapabilityMask>,
{
	members
		.into_iter()
		.map(Into::into)
		.reduce(|acc, member| acc | member)
		.ok_or(MalformedInputError::EmptyFlagSet)
}
