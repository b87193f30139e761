//! Store bundle selected by `database.provider`.

use std::sync::Arc;

use crate::memory::{
    MemoryAttendanceLogStore, MemoryMachineStore, MemoryNotificationStore,
    MemoryRegularizationStore, MemoryStaffStore, MemoryUserStore,
};
use crate::repositories::{
    AttendanceLogRepository, MachineRepository, NotificationRepository, RegularizationRepository,
    StaffRepository, UserRepository,
};
use crate::store::{
    AttendanceLogStore, MachineStore, NotificationStore, RegularizationStore, StaffStore, UserStore,
};
use crate::DatabasePool;

/// One handle per store trait, shared by every service.
#[derive(Debug, Clone)]
pub struct Stores {
    pub attendance: Arc<dyn AttendanceLogStore>,
    pub machines: Arc<dyn MachineStore>,
    pub staff: Arc<dyn StaffStore>,
    pub regularizations: Arc<dyn RegularizationStore>,
    pub notifications: Arc<dyn NotificationStore>,
    pub users: Arc<dyn UserStore>,
}

impl Stores {
    /// PostgreSQL-backed stores sharing one pool.
    pub fn postgres(db: &DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            attendance: Arc::new(AttendanceLogRepository::new(pool.clone())),
            machines: Arc::new(MachineRepository::new(pool.clone())),
            staff: Arc::new(StaffRepository::new(pool.clone())),
            regularizations: Arc::new(RegularizationRepository::new(pool.clone())),
            notifications: Arc::new(NotificationRepository::new(pool.clone())),
            users: Arc::new(UserRepository::new(pool)),
        }
    }

    /// Fresh, empty in-process stores.
    pub fn memory() -> Self {
        Self {
            attendance: Arc::new(MemoryAttendanceLogStore::new()),
            machines: Arc::new(MemoryMachineStore::new()),
            staff: Arc::new(MemoryStaffStore::new()),
            regularizations: Arc::new(MemoryRegularizationStore::new()),
            notifications: Arc::new(MemoryNotificationStore::new()),
            users: Arc::new(MemoryUserStore::new()),
        }
    }
}
