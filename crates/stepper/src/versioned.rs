/// Value paired with a counter that moves on every mutable access, so
/// anything derived from it can tell whether it is stale.
#[derive(Debug, Clone, Default)]
pub struct Versioned<T> {
    version: u64,
    data: T,
}

impl<T> Versioned<T> {
    pub fn new(data: T) -> Self {
        Self { version: 0, data }
    }
    pub fn get(&self) -> &T {
        &self.data
    }
    pub fn get_mut(&mut self) -> &mut T {
        self.version = self.version.wrapping_add(1);
        &mut self.data
    }
    pub fn set(&mut self, data: T) {
        self.data = data;
        self.version = self.version.wrapping_add(1);
    }
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Apply a fallible edit. The version only moves when it succeeds.
    pub fn try_update<R, E>(
        &mut self,
        edit: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Result<R, E> {
        let out = edit(&mut self.data)?;
        self.version = self.version.wrapping_add(1);
        Ok(out)
    }
}
