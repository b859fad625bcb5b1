use relay_core::arbiter::{Role, RoleDecision, acquire_role};

use std::sync::{Arc, Barrier};
use std::thread;

use tempfile::TempDir;

/// **VALUE**: Verifies exactly one of many simultaneous starters becomes the server.
///
/// **WHY THIS MATTERS**: Two servers would both listen for commands and race to open the
/// same file in two hosts.
///
/// **BUG THIS CATCHES**: Would catch a check-then-create race in lock acquisition, or a lock
/// that does not contend between separate opens of the same file.
#[test]
fn given_many_simultaneous_starters_when_acquiring_then_exactly_one_server() {
    // GIVEN: Eight threads released at the same moment
    let temp = TempDir::new().expect("tempdir");
    let path = Arc::new(temp.path().join("relay.lock"));
    let barrier = Arc::new(Barrier::new(8));

    // WHEN: All of them try to lead, keeping their decisions alive
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let path = Arc::clone(&path);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                acquire_role(&path, false).expect("acquire")
            })
        })
        .collect();
    let decisions: Vec<RoleDecision> = handles
        .into_iter()
        .map(|h| h.join().expect("thread"))
        .collect();

    // THEN: One server, seven clients
    let servers = decisions
        .iter()
        .filter(|d| d.role() == Role::Server)
        .count();
    assert_eq!(servers, 1);
    assert!(decisions.iter().filter(|d| d.role() == Role::Client).all(|d| d.lock().is_none()));
}

/// **VALUE**: Verifies the forced-server override and that it leaves the lock alone.
///
/// **WHY THIS MATTERS**: A forced server is for manual diagnostics. It must not steal the
/// lock from the real leader, and later starters must still see that leader.
#[test]
fn given_lock_held_when_forcing_server_then_server_without_lock() {
    // GIVEN: A leader holding the lock
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("relay.lock");
    let leader = acquire_role(&path, false).expect("leader");
    assert_eq!(leader.role(), Role::Server);

    // WHEN: Forcing a second server, then starting normally
    let forced = acquire_role(&path, true).expect("forced");
    let normal = acquire_role(&path, false).expect("normal");

    // THEN: Forced is server without the lock, normal is a client
    assert_eq!(forced.role(), Role::Server);
    assert!(forced.lock().is_none());
    assert_eq!(normal.role(), Role::Client);
}
