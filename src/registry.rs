use crate::service::Service;
use std::{collections::BTreeMap, sync::Arc, sync::RwLock};

/// The shared map of known services, keyed by Unique Service Name.
///
/// Written only by the background listener, one datagram at a time; read
/// concurrently by any number of snapshot callers. Holds at most one record
/// per id, the most recently observed one.
pub(crate) struct Registry(RwLock<BTreeMap<String, Arc<Service>>>);
impl Registry {
	pub fn new() -> Self {
		Self(RwLock::new(BTreeMap::new()))
	}

	/// Replaces whatever record was stored under the service's unique id.
	pub fn upsert(&self, service: Service) {
		self.0
			.write()
			.unwrap()
			.insert(service.unique_id.clone(), Arc::new(service));
	}

	/// Point-in-time copy of all known records, ordered by unique id.
	pub fn snapshot(&self) -> Vec<Arc<Service>> {
		self.0.read().unwrap().values().cloned().collect()
	}

	#[cfg(test)]
	pub fn len(&self) -> usize {
		self.0.read().unwrap().len()
	}
}
