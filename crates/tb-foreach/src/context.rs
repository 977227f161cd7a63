use rayon::prelude::*;
use std::sync::Arc;
use tb_tensor::Device;

/// Explicit execution context passed into every engine entry point.
///
/// Owns the device tag a dispatch targets and, optionally, a dedicated
/// rayon thread pool. `launch` is the single submission point: it issues
/// one data-parallel kernel and returns only after every work-group has
/// completed, so submission and synchronization are paired on every
/// control-flow path.
#[derive(Debug, Clone)]
pub struct ExecContext {
    device: Device,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl ExecContext {
    /// Context executing on the global rayon pool.
    pub fn new(device: Device) -> Self {
        ExecContext { device, pool: None }
    }

    /// Context executing on a caller-owned thread pool.
    pub fn with_pool(device: Device, pool: Arc<rayon::ThreadPool>) -> Self {
        ExecContext {
            device,
            pool: Some(pool),
        }
    }

    /// The device this context dispatches to.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Launch one data-parallel kernel of `width` work-groups.
    ///
    /// Each work-group index in `0..width` is handed to `kernel` exactly
    /// once; work-groups run concurrently and independently. Blocks until
    /// the whole dispatch has completed. A zero-width dispatch is a no-op.
    pub fn launch<F>(&self, width: usize, kernel: F)
    where
        F: Fn(usize) + Send + Sync,
    {
        if width == 0 {
            return;
        }
        match &self.pool {
            Some(pool) => pool.install(|| (0..width).into_par_iter().for_each(&kernel)),
            None => (0..width).into_par_iter().for_each(&kernel),
        }
    }
}

impl Default for ExecContext {
    fn default() -> Self {
        Self::new(Device::Cpu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_launch_visits_every_group_once() {
        let ctx = ExecContext::new(Device::Cpu);
        let counts: Vec<AtomicUsize> = (0..100).map(|_| AtomicUsize::new(0)).collect();
        ctx.launch(100, |g| {
            counts[g].fetch_add(1, Ordering::Relaxed);
        });
        assert!(counts.iter().all(|c| c.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn test_zero_width_launch() {
        let ctx = ExecContext::default();
        ctx.launch(0, |_| panic!("no work-groups expected"));
    }

    #[test]
    fn test_launch_on_owned_pool() {
        let pool = Arc::new(
            rayon::ThreadPoolBuilder::new()
                .num_threads(2)
                .build()
                .unwrap(),
        );
        let ctx = ExecContext::with_pool(Device::Cpu, pool);
        let sum = AtomicUsize::new(0);
        ctx.launch(10, |g| {
            sum.fetch_add(g, Ordering::Relaxed);
        });
        assert_eq!(sum.load(Ordering::Relaxed), 45);
    }
}
