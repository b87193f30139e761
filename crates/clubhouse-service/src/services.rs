//! Service wiring.

use clubhouse_core::config::AppConfig;
use clubhouse_database::Stores;
use clubhouse_device::DeviceGateway;

use crate::attendance::{AttendanceService, IngestService, TimestampParser};
use crate::identity::IdentityService;
use crate::machine::MachineService;
use crate::notification::NotificationService;
use crate::regularization::RegularizationService;

/// Every service, built over one set of stores and one gateway.
#[derive(Debug, Clone)]
pub struct Services {
    pub machines: MachineService,
    pub identity: IdentityService,
    pub attendance: AttendanceService,
    pub ingest: IngestService,
    pub regularization: RegularizationService,
    pub notifications: NotificationService,
}

impl Services {
    pub fn new(stores: &Stores, gateway: DeviceGateway, config: &AppConfig) -> Self {
        let timestamps = TimestampParser::new(config.device.utc_offset_minutes);

        let machines = MachineService::new(
            stores.machines.clone(),
            stores.attendance.clone(),
            stores.staff.clone(),
            gateway.clone(),
        );
        let identity = IdentityService::new(
            stores.staff.clone(),
            stores.machines.clone(),
            gateway.clone(),
        );
        let attendance = AttendanceService::new(
            stores.attendance.clone(),
            stores.machines.clone(),
            stores.staff.clone(),
            timestamps,
        );
        let ingest = IngestService::new(
            stores.attendance.clone(),
            stores.machines.clone(),
            identity.clone(),
            gateway,
            timestamps,
            config.import.clone(),
        );
        let notifications = NotificationService::new(stores.notifications.clone());
        let regularization = RegularizationService::new(
            stores.regularizations.clone(),
            stores.attendance.clone(),
            stores.users.clone(),
            attendance.clone(),
            notifications.clone(),
            timestamps,
        );

        Self {
            machines,
            identity,
            attendance,
            ingest,
            regularization,
            notifications,
        }
    }
}
