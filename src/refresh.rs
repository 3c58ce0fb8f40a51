// SPDX-License-Identifier: MIT

//! Change-notification bus.
//!
//! Services publish a `QueryKey` after every successful mutation; views
//! subscribe and refetch whatever they have on screen for that key. The bus
//! only signals staleness, it caches nothing.

use tokio::sync::broadcast;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 128;

/// Identifies a refetchable view of backend data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKey {
    /// Published courses (the student catalog).
    Courses,
    /// Every course regardless of status (admin).
    AllCourses,
    Course(Uuid),
    Modules { course_id: Uuid },
    Lessons { module_id: Uuid },
    Enrollments { user_id: Uuid },
    UserCourses { user_id: Uuid },
    Progress { user_id: Uuid, course_id: Uuid },
    Students,
    StudentEnrollments { user_id: Uuid },
    Profile { user_id: Uuid },
    ActiveBanners,
    AllBanners,
    ProductMappings,
    FinanceStats,
    Transactions,
    DashboardStats,
}

/// Broadcast bus for mutation notifications. Cheap to clone; all clones
/// share one channel.
#[derive(Clone)]
pub struct RefreshBus {
    tx: broadcast::Sender<QueryKey>,
}

impl RefreshBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.tx.subscribe()
    }

    /// Mark a view stale. No subscribers is fine.
    pub fn invalidate(&self, key: QueryKey) {
        if self.tx.send(key.clone()).is_err() {
            tracing::debug!(?key, "No refresh subscribers");
        }
    }
}

impl Default for RefreshBus {
    fn default() -> Self {
        Self::new()
    }
}
