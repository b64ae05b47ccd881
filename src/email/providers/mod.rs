pub mod null;
pub mod ses;

pub use null::NullProvider;
pub use ses::SesProvider;
