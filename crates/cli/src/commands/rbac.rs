//! RBAC composer command

use anyhow::{Context, Result};
use std::path::Path;
use toolbox_lib::rbac::RbacComposer;

use crate::output::print_success;
use crate::report::write_atomically;

/// Compose a ClusterRole from a `kubectl api-resources` dump.
///
/// `output` of `-` prints the YAML to stdout.
pub fn compose_role(input: &Path, output: &Path, role_name: &str) -> Result<()> {
    let role = RbacComposer::new(role_name)
        .compose_file(input)
        .with_context(|| format!("Failed to compose ClusterRole from {}", input.display()))?;
    let yaml = role.to_yaml()?;

    if output == Path::new("-") {
        print!("{}", yaml);
        return Ok(());
    }

    write_atomically(output, &yaml)?;
    print_success(&format!(
        "ClusterRole '{}' with {} rules written to {}",
        role_name,
        role.rules.len(),
        output.display()
    ));
    Ok(())
}
