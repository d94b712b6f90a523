use trait_set::trait_set;

use crate::generator::NextStepGenerator;

trait_set!
{
    /// Any [generator](NextStepGenerator) the workers of a [runner](crate::runner::Runner) can share.
    pub trait SharedGenerator = NextStepGenerator + Clone + Send + Sync + 'static;
}
