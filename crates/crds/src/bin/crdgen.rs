//! Prints the CRD manifests for every resource in this crate.
//!
//! ```sh
//! cargo run -p crds --bin crdgen > config/crds.yaml
//! ```

use crds::{Device, Provider};
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let crds = [Provider::crd(), Device::crd()];
    for crd in crds {
        print!("---\n{}", serde_yaml::to_string(&crd)?);
    }
    Ok(())
}
