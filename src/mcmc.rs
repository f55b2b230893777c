// Gibbs sampling lifecycle

/// The ordered lifecycle of an uncollapsed Gibbs sampler.
///
/// [`run`] drives one `pre_sample`, then per iteration `pre_iteration`,
/// `sample_z`, `post_z`, `pre_phi`, `sample_phi`, `post_iteration`, and one
/// final `post_sample`. The hooks default to no-ops; a concrete sampler
/// composes behavior by implementing the hooks it needs instead of
/// overriding a base class.
pub trait GibbsCycle {
    type Error;

    fn pre_sample(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn pre_iteration(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn sample_z(&mut self) -> Result<(), Self::Error>;

    fn post_z(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn pre_phi(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn sample_phi(&mut self) -> Result<(), Self::Error>;

    fn post_iteration(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn post_sample(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Drive a sampler through `n_iterations` full cycles. The first error
/// aborts the run; an iteration either completes or the run stops.
pub fn run<C: GibbsCycle>(cycle: &mut C, n_iterations: usize) -> Result<(), C::Error> {
    cycle.pre_sample()?;
    for _ in 0..n_iterations {
        cycle.pre_iteration()?;
        cycle.sample_z()?;
        cycle.post_z()?;
        cycle.pre_phi()?;
        cycle.sample_phi()?;
        cycle.post_iteration()?;
    }
    cycle.post_sample()
}
