//! Shared fixture for service integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use clubhouse_core::config::AppConfig;
use clubhouse_database::Stores;
use clubhouse_device::{DeviceEndpoint, DeviceGateway, DeviceRecord, MockDeviceConnector, MockTerminal};
use clubhouse_entity::machine::Machine;
use clubhouse_entity::staff::Staff;
use clubhouse_entity::user::{User, UserRole};
use clubhouse_service::machine::CreateMachine;
use clubhouse_service::{RequestContext, Services};

pub struct Fixture {
    pub stores: Stores,
    pub mock: MockDeviceConnector,
    pub services: Services,
}

impl Fixture {
    pub fn new() -> Self {
        let config = AppConfig::default();
        let stores = Stores::memory();
        let mock = MockDeviceConnector::new();
        let gateway = DeviceGateway::new(Arc::new(mock.clone()), &config.device);
        let services = Services::new(&stores, gateway, &config);
        Self {
            stores,
            mock,
            services,
        }
    }

    /// Register a machine backed by a reachable mock terminal.
    pub async fn machine(&self, machine_id: &str, ip: &str) -> Machine {
        self.mock
            .add_terminal(DeviceEndpoint::new(ip, 4370), MockTerminal::default());
        self.services
            .machines
            .create(CreateMachine {
                machine_id: machine_id.to_string(),
                name: format!("{machine_id} terminal"),
                ip_address: ip.to_string(),
                port: None,
                location: Some("Main gym".to_string()),
            })
            .await
            .unwrap()
    }

    pub async fn staff(&self, staff_id: &str, name: &str) -> Staff {
        let now = Utc::now();
        self.stores
            .staff
            .create(&Staff {
                id: Uuid::new_v4(),
                staff_id: staff_id.to_string(),
                name: name.to_string(),
                is_active: true,
                biometric_device_id: None,
                biometric_device_user_id: None,
                biometric_registered_at: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap()
    }

    pub async fn user(&self, username: &str, role: UserRole) -> RequestContext {
        let user = self
            .stores
            .users
            .create(&User {
                id: Uuid::new_v4(),
                username: username.to_string(),
                display_name: None,
                role,
                is_active: true,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        RequestContext::new(user.id, user.username, user.display_name, user.role, &[])
    }
}

pub fn endpoint(ip: &str) -> DeviceEndpoint {
    DeviceEndpoint::new(ip, 4370)
}

/// A punch on 2024-01-15 at `hh:mm:00`.
pub fn punch(user_sn: u16, device_user_id: &str, hour: u32, minute: u32) -> DeviceRecord {
    DeviceRecord {
        user_sn,
        device_user_id: device_user_id.to_string(),
        record_time: NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap(),
        record_type: 1,
        verify_mode: 1,
    }
}
