//! Checkout state and its readiness gate.
//!
//! [`CheckoutState`] is plain data kept in the session store. Every change
//! goes through [`CheckoutState::apply`], a pure transition, so the service
//! layer only decides *which* backend calls to make.
//!
//! # Readiness gate
//!
//! A selection is pushed to the remote order only once both the order id and
//! the option list are known. The first option is the default. Each [`Slot`]
//! remembers the id last applied to the order, and [`CheckoutState::pending_patches`]
//! yields a patch exactly when `selected != applied`. Running the gate again
//! after a successful apply yields nothing, whichever input arrived last.

pub mod result;

use core::fmt;

use serde::Serialize;
use vitrina_core::{Address, AddressId, BillingProfile, BillingProfileId, OrderId, PaymentChoice};

/// Something with a backend id that can be offered in a [`Slot`].
pub trait Identified {
    type Id: Copy + Eq + fmt::Debug + Serialize;

    fn id(&self) -> Self::Id;
}

impl Identified for Address {
    type Id = AddressId;

    fn id(&self) -> AddressId {
        self.id
    }
}

impl Identified for BillingProfile {
    type Id = BillingProfileId;

    fn id(&self) -> BillingProfileId {
        self.id
    }
}

/// Options, the shopper's selection and the selection last applied remotely.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "T: Serialize"))]
pub struct Slot<T: Identified> {
    /// `None` until the list has been fetched.
    pub options: Option<Vec<T>>,
    pub selected: Option<T::Id>,
    pub applied: Option<T::Id>,
}

impl<T: Identified> Default for Slot<T> {
    fn default() -> Self {
        Self {
            options: None,
            selected: None,
            applied: None,
        }
    }
}

impl<T: Identified> Slot<T> {
    /// Replace the options, keeping the selection if it is still offered.
    fn load(&mut self, options: Vec<T>) {
        if let Some(selected) = self.selected
            && !options.iter().any(|o| o.id() == selected)
        {
            self.selected = None;
        }
        self.options = Some(options);
        self.select_default();
    }

    /// Select the first option when nothing is selected yet.
    fn select_default(&mut self) {
        if self.selected.is_none() {
            self.selected = self
                .options
                .as_ref()
                .and_then(|options| options.first())
                .map(Identified::id);
        }
    }

    /// Whether `id` is among the loaded options.
    #[must_use]
    pub fn offers(&self, id: T::Id) -> bool {
        self.options
            .as_ref()
            .is_some_and(|options| options.iter().any(|o| o.id() == id))
    }

    /// The selected option, if loaded.
    #[must_use]
    pub fn selected_item(&self) -> Option<&T> {
        let selected = self.selected?;
        self.options.as_ref()?.iter().find(|o| o.id() == selected)
    }

    /// The selection still waiting to be applied to the order.
    #[must_use]
    pub fn pending(&self) -> Option<T::Id> {
        self.selected.filter(|selected| Some(*selected) != self.applied)
    }

    fn revert(&mut self) {
        self.selected = self.applied;
    }
}

/// A change the remote order still needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Patch {
    ShippingAddress(AddressId),
    BillingProfile(BillingProfileId),
}

/// Transitions of the checkout state.
#[derive(Debug, Clone)]
pub enum CheckoutAction {
    /// An order id is known. A different id keeps the shopper's selections
    /// but forgets what was applied, so they are pushed to the new order.
    OrderStarted {
        order_id: OrderId,
        number: Option<String>,
    },
    ShippingAddressesLoaded(Vec<Address>),
    BillingAddressesLoaded(Vec<Address>),
    BillingProfilesLoaded(Vec<BillingProfile>),
    ShippingAddressSelected(AddressId),
    /// Local only: narrows the billing profile options.
    BillingAddressSelected(AddressId),
    BillingProfileSelected(BillingProfileId),
    PatchApplied(Patch),
    /// The backend refused the patch; the selection returns to the applied id.
    PatchFailed(Patch),
    PaymentSelected(PaymentChoice),
    PaymentApplied(PaymentChoice),
    PaymentReverted(Option<PaymentChoice>),
    Confirmed,
}

/// Checkout progress for one order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckoutState {
    pub order_id: Option<OrderId>,
    pub order_number: Option<String>,
    pub shipping: Slot<Address>,
    pub billing_address: Slot<Address>,
    /// Profiles linked to the selected billing address.
    pub billing_profile: Slot<BillingProfile>,
    #[serde(skip)]
    all_billing_profiles: Option<Vec<BillingProfile>>,
    pub payment: Option<PaymentChoice>,
    pub payment_applied: Option<PaymentChoice>,
    pub confirmed: bool,
}

impl CheckoutState {
    /// Apply a transition.
    #[must_use]
    pub fn apply(mut self, action: CheckoutAction) -> Self {
        match action {
            CheckoutAction::OrderStarted { order_id, number } => {
                if self.order_id != Some(order_id) {
                    self.order_id = Some(order_id);
                    self.shipping.applied = None;
                    self.billing_profile.applied = None;
                    self.payment_applied = None;
                    self.confirmed = false;
                    self.order_number = None;
                }
                if number.is_some() {
                    self.order_number = number;
                }
            }
            CheckoutAction::ShippingAddressesLoaded(addresses) => self.shipping.load(addresses),
            CheckoutAction::BillingAddressesLoaded(addresses) => {
                self.billing_address.load(addresses);
                self.refilter_billing_profiles();
            }
            CheckoutAction::BillingProfilesLoaded(profiles) => {
                self.all_billing_profiles = Some(profiles);
                self.refilter_billing_profiles();
            }
            CheckoutAction::ShippingAddressSelected(id) => self.shipping.selected = Some(id),
            CheckoutAction::BillingAddressSelected(id) => {
                if self.billing_address.selected != Some(id) {
                    self.billing_address.selected = Some(id);
                    self.billing_profile.selected = None;
                    self.refilter_billing_profiles();
                }
            }
            CheckoutAction::BillingProfileSelected(id) => {
                // A profile implies its billing address.
                let address_id = self
                    .all_billing_profiles
                    .iter()
                    .flatten()
                    .find(|p| p.id == id)
                    .map(|p| p.address_id);
                if let Some(address_id) = address_id
                    && self.billing_address.selected != Some(address_id)
                {
                    self.billing_address.selected = Some(address_id);
                    self.refilter_billing_profiles();
                }
                self.billing_profile.selected = Some(id);
            }
            CheckoutAction::PatchApplied(Patch::ShippingAddress(id)) => {
                self.shipping.applied = Some(id);
            }
            CheckoutAction::PatchApplied(Patch::BillingProfile(id)) => {
                self.billing_profile.applied = Some(id);
            }
            CheckoutAction::PatchFailed(Patch::ShippingAddress(id)) => {
                if self.shipping.selected == Some(id) {
                    self.shipping.revert();
                }
            }
            CheckoutAction::PatchFailed(Patch::BillingProfile(id)) => {
                if self.billing_profile.selected == Some(id) {
                    self.billing_profile.revert();
                    self.relink_billing_address();
                }
            }
            CheckoutAction::PaymentSelected(choice) => self.payment = Some(choice),
            CheckoutAction::PaymentApplied(choice) => self.payment_applied = Some(choice),
            CheckoutAction::PaymentReverted(previous) => self.payment = previous,
            CheckoutAction::Confirmed => self.confirmed = true,
        }
        self
    }

    /// Point the billing address back at the selected profile's address.
    fn relink_billing_address(&mut self) {
        let Some(selected) = self.billing_profile.selected else {
            return;
        };
        let address_id = self
            .all_billing_profiles
            .iter()
            .flatten()
            .find(|p| p.id == selected)
            .map(|p| p.address_id);
        if let Some(address_id) = address_id
            && self.billing_address.selected != Some(address_id)
        {
            self.billing_address.selected = Some(address_id);
            self.refilter_billing_profiles();
        }
    }

    fn refilter_billing_profiles(&mut self) {
        let Some(all) = &self.all_billing_profiles else {
            return;
        };
        let linked = self.billing_address.selected.map_or_else(Vec::new, |address_id| {
            all.iter()
                .filter(|p| p.address_id == address_id)
                .cloned()
                .collect()
        });
        self.billing_profile.load(linked);
    }

    /// Whether `id` is among the loaded billing profiles, linked or not.
    #[must_use]
    pub fn offers_billing_profile(&self, id: BillingProfileId) -> bool {
        self.all_billing_profiles
            .as_ref()
            .is_some_and(|all| all.iter().any(|p| p.id == id))
    }

    /// Whether the billing profile list has been fetched.
    #[must_use]
    pub const fn billing_profiles_loaded(&self) -> bool {
        self.all_billing_profiles.is_some()
    }

    /// Patches the remote order still needs. Empty until an order id exists.
    #[must_use]
    pub fn pending_patches(&self) -> Vec<Patch> {
        if self.order_id.is_none() {
            return Vec::new();
        }
        self.shipping
            .pending()
            .map(Patch::ShippingAddress)
            .into_iter()
            .chain(self.billing_profile.pending().map(Patch::BillingProfile))
            .collect()
    }

    /// Selections still required before the order can be confirmed.
    #[must_use]
    pub fn missing_selections(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.order_id.is_none() {
            missing.push("order");
        }
        if self.shipping.selected.is_none() {
            missing.push("shipping address");
        }
        if self.billing_address.selected.is_none() {
            missing.push("billing address");
        }
        if self.billing_profile.selected.is_none() {
            missing.push("billing profile");
        }
        missing
    }

    /// Whether the confirm button should be enabled.
    #[must_use]
    pub fn can_confirm(&self) -> bool {
        self.missing_selections().is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use vitrina_core::{AddressKind, DocumentType, TaxCondition};

    use super::*;

    pub(crate) fn address(id: i64, kind: AddressKind) -> Address {
        Address {
            id: AddressId::new(id),
            kind,
            recipient: "Ana Gómez".to_string(),
            street: "Av. Corrientes".to_string(),
            number: format!("{id}00"),
            apartment: None,
            city: "CABA".to_string(),
            province: "Buenos Aires".to_string(),
            postal_code: "1043".to_string(),
            country: "AR".to_string(),
            phone: None,
        }
    }

    pub(crate) fn profile(id: i64, address_id: i64) -> BillingProfile {
        BillingProfile {
            id: BillingProfileId::new(id),
            document_type: DocumentType::Cuit,
            document_number: "20123456789".to_string(),
            tax_condition: TaxCondition::Monotax,
            business_name: None,
            address_id: AddressId::new(address_id),
        }
    }

    fn started(state: CheckoutState, order_id: i64) -> CheckoutState {
        state.apply(CheckoutAction::OrderStarted {
            order_id: OrderId::new(order_id),
            number: Some("A1".to_string()),
        })
    }

    fn loaded(state: CheckoutState) -> CheckoutState {
        state
            .apply(CheckoutAction::ShippingAddressesLoaded(vec![
                address(1, AddressKind::Shipping),
                address(2, AddressKind::Shipping),
            ]))
            .apply(CheckoutAction::BillingAddressesLoaded(vec![
                address(10, AddressKind::Billing),
                address(11, AddressKind::Billing),
            ]))
            .apply(CheckoutAction::BillingProfilesLoaded(vec![
                profile(100, 11),
                profile(101, 10),
                profile(102, 10),
            ]))
    }

    #[test]
    fn test_gate_waits_for_order_id() {
        let state = loaded(CheckoutState::default());
        assert_eq!(state.shipping.selected, Some(AddressId::new(1)));
        assert!(state.pending_patches().is_empty());

        let state = started(state, 7);
        assert_eq!(
            state.pending_patches(),
            vec![
                Patch::ShippingAddress(AddressId::new(1)),
                Patch::BillingProfile(BillingProfileId::new(101)),
            ]
        );
    }

    #[test]
    fn test_gate_independent_of_arrival_order() {
        let lists_first = started(loaded(CheckoutState::default()), 7);
        let order_first = loaded(started(CheckoutState::default(), 7));
        assert_eq!(lists_first.pending_patches(), order_first.pending_patches());
    }

    #[test]
    fn test_gate_is_idempotent_after_apply() {
        let mut state = started(loaded(CheckoutState::default()), 7);
        for patch in state.pending_patches() {
            state = state.apply(CheckoutAction::PatchApplied(patch));
        }
        assert!(state.pending_patches().is_empty());

        // Reloading the same lists does not produce new patches.
        let state = loaded(state);
        assert!(state.pending_patches().is_empty());
    }

    #[test]
    fn test_billing_profiles_filtered_by_billing_address() {
        let state = loaded(CheckoutState::default());
        assert_eq!(state.billing_address.selected, Some(AddressId::new(10)));
        let ids: Vec<_> = state
            .billing_profile
            .options
            .as_ref()
            .unwrap()
            .iter()
            .map(|p| p.id.as_i64())
            .collect();
        assert_eq!(ids, vec![101, 102]);

        let state = state.apply(CheckoutAction::BillingAddressSelected(AddressId::new(11)));
        assert_eq!(state.billing_profile.selected, Some(BillingProfileId::new(100)));
    }

    #[test]
    fn test_selecting_profile_selects_its_address() {
        let state = loaded(CheckoutState::default())
            .apply(CheckoutAction::BillingProfileSelected(BillingProfileId::new(100)));
        assert_eq!(state.billing_address.selected, Some(AddressId::new(11)));
        assert_eq!(state.billing_profile.selected, Some(BillingProfileId::new(100)));
    }

    #[test]
    fn test_failed_patch_reverts_to_applied() {
        let state = started(loaded(CheckoutState::default()), 7)
            .apply(CheckoutAction::PatchApplied(Patch::ShippingAddress(AddressId::new(1))))
            .apply(CheckoutAction::ShippingAddressSelected(AddressId::new(2)))
            .apply(CheckoutAction::PatchFailed(Patch::ShippingAddress(AddressId::new(2))));
        assert_eq!(state.shipping.selected, Some(AddressId::new(1)));
        assert_eq!(state.shipping.pending(), None);
    }

    #[test]
    fn test_failed_profile_patch_relinks_billing_address() {
        let state = started(loaded(CheckoutState::default()), 7)
            .apply(CheckoutAction::PatchApplied(Patch::BillingProfile(
                BillingProfileId::new(101),
            )))
            .apply(CheckoutAction::BillingAddressSelected(AddressId::new(11)));
        assert_eq!(
            state.pending_patches(),
            vec![
                Patch::ShippingAddress(AddressId::new(1)),
                Patch::BillingProfile(BillingProfileId::new(100)),
            ]
        );

        let state = state.apply(CheckoutAction::PatchFailed(Patch::BillingProfile(
            BillingProfileId::new(100),
        )));
        assert_eq!(state.billing_profile.selected, Some(BillingProfileId::new(101)));
        assert_eq!(state.billing_address.selected, Some(AddressId::new(10)));
        assert!(state.billing_profile.offers(BillingProfileId::new(101)));
        assert_eq!(state.billing_profile.pending(), None);
    }

    #[test]
    fn test_new_order_reapplies_selections() {
        let mut state = started(loaded(CheckoutState::default()), 7);
        for patch in state.pending_patches() {
            state = state.apply(CheckoutAction::PatchApplied(patch));
        }
        let state = started(state, 8);
        assert_eq!(state.pending_patches().len(), 2);
        assert_eq!(state.order_id, Some(OrderId::new(8)));
    }

    #[test]
    fn test_can_confirm_requires_every_selection() {
        let state = started(CheckoutState::default(), 7);
        assert!(!state.can_confirm());
        assert_eq!(
            state.missing_selections(),
            vec!["shipping address", "billing address", "billing profile"]
        );

        let state = loaded(state);
        assert!(state.can_confirm());
    }

    #[test]
    fn test_no_linked_profile_blocks_confirm() {
        let state = started(CheckoutState::default(), 7)
            .apply(CheckoutAction::ShippingAddressesLoaded(vec![address(
                1,
                AddressKind::Shipping,
            )]))
            .apply(CheckoutAction::BillingAddressesLoaded(vec![address(
                10,
                AddressKind::Billing,
            )]))
            .apply(CheckoutAction::BillingProfilesLoaded(vec![profile(100, 99)]));
        assert_eq!(state.billing_profile.selected, None);
        assert_eq!(state.missing_selections(), vec!["billing profile"]);
    }

    #[test]
    fn test_payment_revert() {
        let state = CheckoutState::default()
            .apply(CheckoutAction::PaymentSelected(PaymentChoice::Transfer))
            .apply(CheckoutAction::PaymentApplied(PaymentChoice::Transfer))
            .apply(CheckoutAction::PaymentSelected(PaymentChoice::Wallet))
            .apply(CheckoutAction::PaymentReverted(Some(PaymentChoice::Transfer)));
        assert_eq!(state.payment, Some(PaymentChoice::Transfer));
    }
}
