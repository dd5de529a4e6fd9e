use crate::core::engine::SyncRun;
use crate::domain::model::{MutationKind, RelationshipSet};
use std::fmt::Write;

/// Human-readable summary of one run, as printed by the CLI.
pub fn render_run(run: &SyncRun) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\nTotal followers: {}", run.followers.total_count);
    let _ = writeln!(out, "Total following: {}", run.following.total_count);

    if run.is_degraded() {
        for collected in [&run.followers, &run.following] {
            if collected.degraded {
                let _ = writeln!(
                    out,
                    "⚠️  Could not fetch {}; treated as empty for this run.",
                    collected.kind
                );
            }
        }
    }

    if run.plan.to_unfollow.is_empty() {
        let _ = writeln!(out, "\nEveryone you are following follows you back.");
    } else {
        let _ = writeln!(out, "\nPeople you are following who don't follow you back:");
        write_logins(&mut out, &run.plan.to_unfollow);
    }

    if run.plan.to_follow_back.is_empty() {
        let _ = writeln!(out, "\nYou follow back everyone who follows you.");
    } else {
        let _ = writeln!(out, "\nPeople following you that you don't follow back:");
        write_logins(&mut out, &run.plan.to_follow_back);
    }

    if run.apply_withheld {
        let _ = writeln!(out, "\nChanges were not applied because a collection failed.");
    }

    if let Some(report) = &run.report {
        let unfollowed = report.applied(MutationKind::Unfollow);
        let followed = report.applied(MutationKind::FollowBack);
        let _ = writeln!(
            out,
            "\nUnfollowed {}, followed back {}.",
            unfollowed.len(),
            followed.len()
        );
        for login in unfollowed {
            let _ = writeln!(out, "  - {}", login);
        }
        for login in followed {
            let _ = writeln!(out, "  + {}", login);
        }
        for (entry, status) in report.rejected() {
            let _ = writeln!(out, "  ! {} {} rejected (HTTP {})", entry.kind, entry.login, status);
        }
        for (entry, error) in report.failed() {
            let _ = writeln!(out, "  ! {} {} failed: {}", entry.kind, entry.login, error);
        }
        let skipped = report.skipped();
        if skipped > 0 {
            let _ = writeln!(out, "  {} changes not attempted (cancelled).", skipped);
        }
    }

    out
}

fn write_logins(out: &mut String, logins: &RelationshipSet) {
    for login in logins.iter() {
        let _ = writeln!(out, "{}", login);
    }
}
