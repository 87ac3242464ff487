use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use motorlot_core::{AggregateId, AggregateRoot, DomainError, DomainResult, Money};
use motorlot_events::Event;

/// Vehicle identifier (internal identity; the stock number is the external one).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub AggregateId);

impl VehicleId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Vehicle identification number.
///
/// 17 characters, ASCII alphanumeric, uppercase, with I/O/Q excluded (they are
/// not valid VIN characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vin(String);

impl Vin {
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        if value.len() != 17 {
            return Err(DomainError::validation(format!(
                "VIN must be 17 characters, got {}",
                value.len()
            )));
        }
        let valid = value
            .bytes()
            .all(|b| (b.is_ascii_uppercase() || b.is_ascii_digit()) && !matches!(b, b'I' | b'O' | b'Q'));
        if !valid {
            return Err(DomainError::validation(format!(
                "VIN contains invalid characters: '{value}'"
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Vin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Vehicle availability lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    Reserved,
    Sold,
    InService,
    Damaged,
    Returned,
}

impl VehicleStatus {
    /// Central transition table. Every guard consults this; there are no
    /// side channels that make a transition legal.
    pub fn can_transition(self, to: VehicleStatus) -> bool {
        use VehicleStatus::*;
        matches!(
            (self, to),
            (Available, Reserved)
                | (Available, InService)
                | (Available, Damaged)
                | (Reserved, Sold)
                | (Reserved, Available)
                | (Reserved, InService)
                | (Reserved, Damaged)
                | (Sold, InService)
                | (Sold, Returned)
                | (InService, Available)
                | (InService, Damaged)
                | (Returned, Available)
                | (Returned, Damaged)
                | (Damaged, Available)
        )
    }

    /// Terminal for damage purposes: a sold vehicle is with its buyer and a
    /// damaged one is already written off.
    pub fn is_terminal(self) -> bool {
        matches!(self, VehicleStatus::Sold | VehicleStatus::Damaged)
    }
}

impl core::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            VehicleStatus::Available => "available",
            VehicleStatus::Reserved => "reserved",
            VehicleStatus::Sold => "sold",
            VehicleStatus::InService => "in_service",
            VehicleStatus::Damaged => "damaged",
            VehicleStatus::Returned => "returned",
        };
        f.write_str(s)
    }
}

/// Registration sub-record (license plate + validity window).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRegistration {
    pub plate_number: String,
    pub registered_on: DateTime<Utc>,
    pub expires_on: DateTime<Utc>,
}

/// Aggregate root: Vehicle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    id: VehicleId,
    stock_number: String,
    vin: Vin,
    model_number: String,
    brand: String,
    status: VehicleStatus,
    /// Acquisition cost; the model base price for the pricing floor.
    purchase_price: Money,
    /// Asking price; the base price discounts apply to.
    list_price: Money,
    sale_price: Option<Money>,
    registration: Option<VehicleRegistration>,
    deleted: bool,
    version: u64,
}

impl Vehicle {
    /// Materialize a new vehicle into inventory (`Available`).
    ///
    /// Vehicles only enter inventory through an accepted goods receipt; the
    /// procurement handler maps receipt lines into this constructor.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: VehicleId,
        stock_number: impl Into<String>,
        vin: Vin,
        model_number: impl Into<String>,
        brand: impl Into<String>,
        purchase_price: Money,
        list_price: Money,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<(Self, VehicleEvent)> {
        let stock_number = stock_number.into();
        let model_number = model_number.into();
        let brand = brand.into();

        if stock_number.trim().is_empty() {
            return Err(DomainError::validation("stock number cannot be empty"));
        }
        if model_number.trim().is_empty() {
            return Err(DomainError::validation("model number cannot be empty"));
        }
        if brand.trim().is_empty() {
            return Err(DomainError::validation("brand cannot be empty"));
        }
        purchase_price.ensure_same_currency(&list_price)?;
        if purchase_price.is_negative() || list_price.is_negative() {
            return Err(DomainError::validation("vehicle prices cannot be negative"));
        }

        let vehicle = Self {
            id,
            stock_number: stock_number.clone(),
            vin: vin.clone(),
            model_number: model_number.clone(),
            brand: brand.clone(),
            status: VehicleStatus::Available,
            purchase_price: purchase_price.clone(),
            list_price: list_price.clone(),
            sale_price: None,
            registration: None,
            deleted: false,
            version: 1,
        };

        let event = VehicleEvent::VehicleCreated(VehicleCreated {
            vehicle_id: id,
            stock_number,
            vin,
            model_number,
            brand,
            purchase_price,
            list_price,
            occurred_at,
        });

        Ok((vehicle, event))
    }

    pub fn id_typed(&self) -> VehicleId {
        self.id
    }

    pub fn stock_number(&self) -> &str {
        &self.stock_number
    }

    pub fn vin(&self) -> &Vin {
        &self.vin
    }

    pub fn model_number(&self) -> &str {
        &self.model_number
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    pub fn purchase_price(&self) -> &Money {
        &self.purchase_price
    }

    pub fn list_price(&self) -> &Money {
        &self.list_price
    }

    pub fn sale_price(&self) -> Option<&Money> {
        self.sale_price.as_ref()
    }

    pub fn registration(&self) -> Option<&VehicleRegistration> {
        self.registration.as_ref()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Place a hold on the vehicle during order processing.
    ///
    /// Legal only from `Available`; a second reservation fails.
    pub fn reserve(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<VehicleEvent> {
        self.ensure_status(VehicleStatus::Available, "reserve")?;
        self.transition_to(VehicleStatus::Reserved, occurred_at)
    }

    /// Close the sale of a reserved vehicle, recording the final sale price.
    pub fn mark_sold(
        &mut self,
        sale_price: Money,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<VehicleEvent> {
        self.ensure_active()?;
        self.ensure_status(VehicleStatus::Reserved, "sell")?;
        sale_price.ensure_same_currency(&self.list_price)?;
        if sale_price.is_negative() {
            return Err(DomainError::validation("sale price cannot be negative"));
        }

        self.status = VehicleStatus::Sold;
        self.sale_price = Some(sale_price.clone());
        self.touch();

        Ok(VehicleEvent::VehicleSold(VehicleSold {
            vehicle_id: self.id,
            sale_price,
            occurred_at,
        }))
    }

    /// Release a reservation (order cancellation) back to `Available`.
    pub fn release(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<VehicleEvent> {
        self.ensure_status(VehicleStatus::Reserved, "release")?;
        self.transition_to(VehicleStatus::Available, occurred_at)
    }

    /// Take back a sold vehicle (accepted return request).
    pub fn mark_returned(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<VehicleEvent> {
        self.ensure_status(VehicleStatus::Sold, "return")?;
        self.transition_to(VehicleStatus::Returned, occurred_at)
    }

    /// Put a returned vehicle back on the lot.
    pub fn restock(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<VehicleEvent> {
        self.ensure_status(VehicleStatus::Returned, "restock")?;
        let event = self.transition_to(VehicleStatus::Available, occurred_at)?;
        self.sale_price = None;
        Ok(event)
    }

    /// Send the vehicle to the workshop.
    pub fn send_to_service(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<VehicleEvent> {
        self.transition_to(VehicleStatus::InService, occurred_at)
    }

    /// Servicing finished; the vehicle goes back on the lot.
    pub fn complete_service(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<VehicleEvent> {
        self.ensure_status(VehicleStatus::InService, "complete service for")?;
        self.transition_to(VehicleStatus::Available, occurred_at)
    }

    /// Write the vehicle off. Legal from any non-terminal state.
    pub fn mark_damaged(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<VehicleEvent> {
        self.ensure_active()?;
        if self.status.is_terminal() {
            return Err(DomainError::invalid_transition(format!(
                "cannot mark vehicle {} damaged in terminal status {}",
                self.id, self.status
            )));
        }
        self.transition_to(VehicleStatus::Damaged, occurred_at)
    }

    /// Manual reactivation of a damaged vehicle after repair.
    pub fn reactivate(&mut self, occurred_at: DateTime<Utc>) -> DomainResult<VehicleEvent> {
        self.ensure_status(VehicleStatus::Damaged, "reactivate")?;
        self.transition_to(VehicleStatus::Available, occurred_at)
    }

    /// Attach the registration sub-record (license plate + validity window).
    pub fn register(
        &mut self,
        plate_number: impl Into<String>,
        registered_on: DateTime<Utc>,
        expires_on: DateTime<Utc>,
    ) -> DomainResult<VehicleEvent> {
        self.ensure_active()?;
        let plate_number = plate_number.into();
        if plate_number.trim().is_empty() {
            return Err(DomainError::validation("plate number cannot be empty"));
        }
        if expires_on <= registered_on {
            return Err(DomainError::validation(
                "registration expiry must be after the registration date",
            ));
        }
        if self.registration.is_some() {
            return Err(DomainError::validation(format!(
                "vehicle {} is already registered",
                self.id
            )));
        }

        self.registration = Some(VehicleRegistration {
            plate_number: plate_number.clone(),
            registered_on,
            expires_on,
        });
        self.touch();

        Ok(VehicleEvent::VehicleRegistrationCreated(
            VehicleRegistrationCreated {
                vehicle_id: self.id,
                plate_number,
                registered_on,
                expires_on,
                occurred_at: registered_on,
            },
        ))
    }

    /// Soft delete. The record stays for audit; no transition applies afterwards.
    pub fn mark_deleted(&mut self) -> DomainResult<()> {
        self.ensure_active()?;
        if self.status == VehicleStatus::Reserved {
            return Err(DomainError::invalid_transition(format!(
                "cannot delete vehicle {} while it is reserved",
                self.id
            )));
        }
        self.deleted = true;
        self.touch();
        Ok(())
    }

    fn ensure_active(&self) -> DomainResult<()> {
        if self.deleted {
            return Err(DomainError::not_found(format!(
                "vehicle {} is deleted",
                self.id
            )));
        }
        Ok(())
    }

    fn ensure_status(&self, expected: VehicleStatus, operation: &str) -> DomainResult<()> {
        self.ensure_active()?;
        if self.status != expected {
            return Err(DomainError::invalid_transition(format!(
                "cannot {operation} vehicle {} in status {}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    fn transition_to(
        &mut self,
        to: VehicleStatus,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<VehicleEvent> {
        self.ensure_active()?;
        if !self.status.can_transition(to) {
            return Err(DomainError::invalid_transition(format!(
                "vehicle {}: {} -> {}",
                self.id, self.status, to
            )));
        }

        let from = self.status;
        self.status = to;
        self.touch();

        Ok(VehicleEvent::VehicleStatusChanged(VehicleStatusChanged {
            vehicle_id: self.id,
            from,
            to,
            occurred_at,
        }))
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}

impl AggregateRoot for Vehicle {
    type Id = VehicleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Event: VehicleCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleCreated {
    pub vehicle_id: VehicleId,
    pub stock_number: String,
    pub vin: Vin,
    pub model_number: String,
    pub brand: String,
    pub purchase_price: Money,
    pub list_price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: VehicleStatusChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleStatusChanged {
    pub vehicle_id: VehicleId,
    pub from: VehicleStatus,
    pub to: VehicleStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: VehicleSold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSold {
    pub vehicle_id: VehicleId,
    pub sale_price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: VehicleRegistrationCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRegistrationCreated {
    pub vehicle_id: VehicleId,
    pub plate_number: String,
    pub registered_on: DateTime<Utc>,
    pub expires_on: DateTime<Utc>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleEvent {
    VehicleCreated(VehicleCreated),
    VehicleStatusChanged(VehicleStatusChanged),
    VehicleSold(VehicleSold),
    VehicleRegistrationCreated(VehicleRegistrationCreated),
}

impl Event for VehicleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            VehicleEvent::VehicleCreated(_) => "vehicles.vehicle.created",
            VehicleEvent::VehicleStatusChanged(_) => "vehicles.vehicle.status_changed",
            VehicleEvent::VehicleSold(_) => "vehicles.vehicle.sold",
            VehicleEvent::VehicleRegistrationCreated(_) => {
                "vehicles.vehicle.registration_created"
            }
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            VehicleEvent::VehicleCreated(e) => e.occurred_at,
            VehicleEvent::VehicleStatusChanged(e) => e.occurred_at,
            VehicleEvent::VehicleSold(e) => e.occurred_at,
            VehicleEvent::VehicleRegistrationCreated(e) => e.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use motorlot_core::Currency;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn test_vehicle_id() -> VehicleId {
        VehicleId::new(AggregateId::new())
    }

    fn test_vin() -> Vin {
        Vin::new("1HGBH41JXMN109186").unwrap()
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn usd(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount, Currency::usd())
    }

    fn test_vehicle() -> Vehicle {
        let (vehicle, _) = Vehicle::new(
            test_vehicle_id(),
            "LOT-0042",
            test_vin(),
            "CIVIC-2024",
            "Honda",
            usd(dec!(18000)),
            usd(dec!(21500)),
            test_time(),
        )
        .unwrap();
        vehicle
    }

    #[test]
    fn new_vehicle_is_available_and_emits_created_event() {
        let id = test_vehicle_id();
        let (vehicle, event) = Vehicle::new(
            id,
            "LOT-0001",
            test_vin(),
            "COROLLA-2023",
            "Toyota",
            usd(dec!(15000)),
            usd(dec!(17900)),
            test_time(),
        )
        .unwrap();

        assert_eq!(vehicle.status(), VehicleStatus::Available);
        assert_eq!(vehicle.version(), 1);
        assert!(vehicle.sale_price().is_none());
        match event {
            VehicleEvent::VehicleCreated(e) => {
                assert_eq!(e.vehicle_id, id);
                assert_eq!(e.brand, "Toyota");
            }
            _ => panic!("Expected VehicleCreated event"),
        }
    }

    #[test]
    fn reserve_moves_available_to_reserved() {
        let mut vehicle = test_vehicle();
        let event = vehicle.reserve(test_time()).unwrap();

        assert_eq!(vehicle.status(), VehicleStatus::Reserved);
        match event {
            VehicleEvent::VehicleStatusChanged(e) => {
                assert_eq!(e.from, VehicleStatus::Available);
                assert_eq!(e.to, VehicleStatus::Reserved);
            }
            _ => panic!("Expected VehicleStatusChanged event"),
        }
    }

    #[test]
    fn second_reserve_fails_with_invalid_state_transition() {
        let mut vehicle = test_vehicle();
        vehicle.reserve(test_time()).unwrap();

        let err = vehicle.reserve(test_time()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition(_)));
        assert_eq!(vehicle.status(), VehicleStatus::Reserved);
    }

    #[test]
    fn mark_sold_requires_reservation_and_stores_sale_price() {
        let mut vehicle = test_vehicle();

        let err = vehicle.mark_sold(usd(dec!(21000)), test_time()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition(_)));

        vehicle.reserve(test_time()).unwrap();
        let event = vehicle.mark_sold(usd(dec!(21000)), test_time()).unwrap();

        assert_eq!(vehicle.status(), VehicleStatus::Sold);
        assert_eq!(vehicle.sale_price(), Some(&usd(dec!(21000))));
        match event {
            VehicleEvent::VehicleSold(e) => assert_eq!(e.sale_price, usd(dec!(21000))),
            _ => panic!("Expected VehicleSold event"),
        }
    }

    #[test]
    fn release_returns_reservation_to_available() {
        let mut vehicle = test_vehicle();
        vehicle.reserve(test_time()).unwrap();
        vehicle.release(test_time()).unwrap();
        assert_eq!(vehicle.status(), VehicleStatus::Available);
    }

    #[test]
    fn return_then_restock_round_trips_through_returned() {
        let mut vehicle = test_vehicle();
        vehicle.reserve(test_time()).unwrap();
        vehicle.mark_sold(usd(dec!(21500)), test_time()).unwrap();

        vehicle.mark_returned(test_time()).unwrap();
        assert_eq!(vehicle.status(), VehicleStatus::Returned);

        // Restock is an explicit, separate step.
        vehicle.restock(test_time()).unwrap();
        assert_eq!(vehicle.status(), VehicleStatus::Available);
        assert!(vehicle.sale_price().is_none());
    }

    #[test]
    fn sold_vehicles_cannot_be_marked_damaged() {
        let mut vehicle = test_vehicle();
        vehicle.reserve(test_time()).unwrap();
        vehicle.mark_sold(usd(dec!(21500)), test_time()).unwrap();

        let err = vehicle.mark_damaged(test_time()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition(_)));
    }

    #[test]
    fn damaged_vehicle_is_terminal_until_reactivated() {
        let mut vehicle = test_vehicle();
        vehicle.mark_damaged(test_time()).unwrap();
        assert_eq!(vehicle.status(), VehicleStatus::Damaged);

        let err = vehicle.reserve(test_time()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition(_)));

        vehicle.reactivate(test_time()).unwrap();
        assert_eq!(vehicle.status(), VehicleStatus::Available);
    }

    #[test]
    fn service_round_trip_returns_to_available() {
        let mut vehicle = test_vehicle();
        vehicle.reserve(test_time()).unwrap();
        vehicle.send_to_service(test_time()).unwrap();
        assert_eq!(vehicle.status(), VehicleStatus::InService);
        vehicle.complete_service(test_time()).unwrap();
        assert_eq!(vehicle.status(), VehicleStatus::Available);
    }

    #[test]
    fn no_transition_applies_to_a_soft_deleted_vehicle() {
        let mut vehicle = test_vehicle();
        vehicle.mark_deleted().unwrap();

        let err = vehicle.reserve(test_time()).unwrap_err();
        assert!(matches!(err, DomainError::EntityNotFound(_)));
        let err = vehicle.mark_damaged(test_time()).unwrap_err();
        assert!(matches!(err, DomainError::EntityNotFound(_)));
    }

    #[test]
    fn reserved_vehicles_cannot_be_deleted() {
        let mut vehicle = test_vehicle();
        vehicle.reserve(test_time()).unwrap();
        let err = vehicle.mark_deleted().unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition(_)));
    }

    #[test]
    fn registration_is_created_once() {
        let mut vehicle = test_vehicle();
        let registered_on = test_time();
        let expires_on = registered_on + Duration::days(365);

        let event = vehicle
            .register("M-OT 1042", registered_on, expires_on)
            .unwrap();
        match event {
            VehicleEvent::VehicleRegistrationCreated(e) => {
                assert_eq!(e.plate_number, "M-OT 1042");
            }
            _ => panic!("Expected VehicleRegistrationCreated event"),
        }

        let err = vehicle
            .register("M-OT 9999", registered_on, expires_on)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn version_increments_once_per_successful_mutation() {
        let mut vehicle = test_vehicle();
        assert_eq!(vehicle.version(), 1);

        vehicle.reserve(test_time()).unwrap();
        assert_eq!(vehicle.version(), 2);

        // Failed operations do not move the version.
        let _ = vehicle.reserve(test_time()).unwrap_err();
        assert_eq!(vehicle.version(), 2);

        vehicle.release(test_time()).unwrap();
        assert_eq!(vehicle.version(), 3);
    }

    #[test]
    fn vin_validation_rejects_bad_input() {
        assert!(Vin::new("1HGBH41JXMN109186").is_ok());
        assert!(Vin::new("1HGBH41JXMN10918").is_err()); // 16 chars
        assert!(Vin::new("1HGBH41JXMN1091IO").is_err()); // I and O excluded
        assert!(Vin::new("1hgbh41jxmn109186").is_err()); // lowercase
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any operation sequence, successful operations follow
        /// the transition table and failed ones leave the status untouched.
        #[test]
        fn operation_sequences_respect_the_transition_table(
            ops in prop::collection::vec(0u8..9u8, 1..40)
        ) {
            let mut vehicle = test_vehicle();
            let now = test_time();

            for op in ops {
                let before = vehicle.status();
                let result = match op {
                    0 => vehicle.reserve(now),
                    1 => vehicle.mark_sold(usd(dec!(21000)), now),
                    2 => vehicle.release(now),
                    3 => vehicle.mark_returned(now),
                    4 => vehicle.restock(now),
                    5 => vehicle.send_to_service(now),
                    6 => vehicle.complete_service(now),
                    7 => vehicle.mark_damaged(now),
                    _ => vehicle.reactivate(now),
                };

                match result {
                    Ok(_) => prop_assert!(before.can_transition(vehicle.status())),
                    Err(_) => prop_assert_eq!(vehicle.status(), before),
                }
            }
        }
    }
}
