//! Capability descriptors, per-grouping capability sets, and storable flag masks.
//!
//! A [`Capability`] names one grantable permission. Types implementing
//! [`CapabilityGroup`] register their declared constants exactly once and hand out the
//! frozen [`CapabilitySet`] by reference afterwards. Persisted grants use the integer
//! [`CapabilityMask`] produced from [`CapabilityFlag`] members.

pub mod mask;

pub use mask::*;

// std
use std::{cmp::Ordering, collections::BTreeSet, sync::OnceLock};
// self
use crate::_prelude::*;

/// Immutable descriptor of a grantable permission.
///
/// Equality, ordering, and hashing consider only [`identifier`](Self::identifier); the label
/// and description are presentation metadata.
#[derive(Clone, Copy, Serialize)]
pub struct Capability {
	/// Stable identifier, unique within a grouping.
	pub identifier: &'static str,
	/// Short human-readable label.
	pub label: &'static str,
	/// Longer description for consent screens.
	pub description: &'static str,
}
impl Capability {
	/// Declares a capability constant.
	pub const fn new(
		identifier: &'static str,
		label: &'static str,
		description: &'static str,
	) -> Self {
		Self { identifier, label, description }
	}
}
impl PartialEq for Capability {
	fn eq(&self, other: &Self) -> bool {
		self.identifier == other.identifier
	}
}
impl Eq for Capability {}
impl PartialOrd for Capability {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
impl Ord for Capability {
	fn cmp(&self, other: &Self) -> Ordering {
		self.identifier.cmp(other.identifier)
	}
}
impl Hash for Capability {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.identifier.hash(state);
	}
}
impl Debug for Capability {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Capability").field(&self.identifier).finish()
	}
}
impl Display for Capability {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.identifier)
	}
}

/// Frozen set of capabilities declared by one grouping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapabilitySet {
	members: BTreeSet<Capability>,
}
impl CapabilitySet {
	/// Freezes the declared capabilities of a grouping.
	///
	/// Call once per grouping, typically from [`CapabilityGroup::declared_capability_set`].
	/// Duplicate identifiers collapse into one member; an empty declaration yields an empty set.
	pub fn register(declared: &[Capability]) -> Self {
		Self { members: declared.iter().copied().collect() }
	}

	/// Number of distinct capabilities.
	pub fn len(&self) -> usize {
		self.members.len()
	}

	/// Returns true when the grouping declares nothing.
	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
	}

	/// Membership test by identifier.
	pub fn contains(&self, capability: &Capability) -> bool {
		self.members.contains(capability)
	}

	/// Looks a capability up by identifier.
	pub fn get(&self, identifier: &str) -> Option<&Capability> {
		self.members.iter().find(|capability| capability.identifier == identifier)
	}

	/// Iterator over members ordered by identifier.
	pub fn iter(&self) -> impl Iterator<Item = &Capability> {
		self.members.iter()
	}
}

/// A type that groups capability constants.
///
/// Implementors list their public constants once and cache the frozen set:
///
/// ```
/// use std::sync::OnceLock;
///
/// use imp_sandbox::capability::{Capability, CapabilityGroup, CapabilitySet};
///
/// struct Calendar;
/// impl Calendar {
/// 	pub const READ: Capability = Capability::new("read", "Read", "Read events.");
/// }
/// impl CapabilityGroup for Calendar {
/// 	fn declared_capability_set() -> &'static CapabilitySet {
/// 		static SET: OnceLock<CapabilitySet> = OnceLock::new();
///
/// 		SET.get_or_init(|| CapabilitySet::register(&[Self::READ]))
/// 	}
/// }
///
/// assert_eq!(Calendar::declared_capability_set().len(), 1);
/// ```
pub trait CapabilityGroup {
	/// The frozen set of capabilities declared by this grouping.
	fn declared_capability_set() -> &'static CapabilitySet;
}

/// Built-in grouping for storage addons.
#[derive(Clone, Copy, Debug)]
pub struct StorageCapability;
impl StorageCapability {
	/// Read stored items.
	pub const ACCESS: Capability =
		Capability::new("access", "Access", "Read the contents of stored items.");
	/// List folders and item metadata.
	pub const BROWSE: Capability =
		Capability::new("browse", "Browse", "List folders and item metadata.");
	/// Finalize pending changes.
	pub const COMMIT: Capability =
		Capability::new("commit", "Commit", "Finalize pending changes in the external service.");
	/// Create, modify, and delete items.
	pub const UPDATE: Capability =
		Capability::new("update", "Update", "Create, modify, and delete stored items.");
}
impl CapabilityGroup for StorageCapability {
	fn declared_capability_set() -> &'static CapabilitySet {
		static SET: OnceLock<CapabilitySet> = OnceLock::new();

		SET.get_or_init(|| {
			CapabilitySet::register(&[Self::ACCESS, Self::BROWSE, Self::UPDATE, Self::COMMIT])
		})
	}
}
