//! `elon identity verify|acknowledge` (§10.4, §4.1).

use elon_safety::IdentityGuard;

use crate::cli::args::IdentityAction;
use crate::context::Context;
use crate::ElonError;

pub fn run(ctx: &Context, action: &IdentityAction) -> Result<(), ElonError> {
    let pinned = IdentityGuard::load_persisted(ctx.data_dir.as_std_path());
    let mut guard = IdentityGuard::load_or_initialize(ctx.repo_root.as_std_path(), pinned);

    match action {
        IdentityAction::Verify => {
            let result = guard.verify();
            if result.valid {
                println!("identity OK: no changes since last pin");
                Ok(())
            } else {
                println!("identity TAMPERED: {} change(s)", result.changes.len());
                for change in &result.changes {
                    println!("  {}: expected {}, got {}", change.file, change.expected, change.actual);
                }
                Err(ElonError::IdentityTampered {
                    file: result.changes[0].file.clone(),
                    expected: result.changes[0].expected.clone(),
                    actual: result.changes[0].actual.clone(),
                })
            }
        }
        IdentityAction::Acknowledge => {
            guard.acknowledge();
            guard.persist(ctx.data_dir.as_std_path()).map_err(ElonError::Other)?;
            println!("identity re-pinned");
            Ok(())
        }
    }
}
