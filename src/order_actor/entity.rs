use chrono::Utc;

use super::actions::{OrderAction, StatusChange};
use super::error::OrderError;
use crate::actor_framework::Entity;
use crate::domain::{CustomerId, Order, OrderCreate, OrderItem, OrderPatch, OrderStatus, Transition};

impl Entity for Order {
    type Id = String;
    type CreateParams = OrderCreate;
    type Patch = OrderPatch;
    type Action = OrderAction;
    type ActionResult = StatusChange;
    type Error = OrderError;

    fn id(&self) -> &String {
        &self.id
    }

    /// Creates a new Order from coupon entry parameters.
    ///
    /// # Notes
    /// Orders enter the board as either `Pending` or `Preparing`, depending on
    /// the workflow. Without an explicit customer the owner is derived from the
    /// coupon number.
    fn from_create_params(id: String, params: OrderCreate) -> Result<Self, OrderError> {
        if !matches!(
            params.initial_status,
            OrderStatus::Pending | OrderStatus::Preparing
        ) {
            return Err(OrderError::Validation(format!(
                "orders cannot start as {}",
                params.initial_status
            )));
        }
        validate_items(&params.items)?;

        let customer = params
            .customer
            .unwrap_or_else(|| CustomerId::for_coupon(params.coupon_number));

        Ok(Self {
            id,
            coupon_number: params.coupon_number,
            customer,
            items: params.items,
            status: params.initial_status,
            created_at: Utc::now(),
        })
    }

    /// Applies staff corrections.
    ///
    /// A coupon-derived owner follows the coupon to its new number; an
    /// explicit customer is kept.
    fn on_update(&mut self, patch: OrderPatch) -> Result<(), OrderError> {
        if let Some(items) = patch.items {
            validate_items(&items)?;
            self.items = items;
        }
        if let Some(coupon) = patch.coupon_number {
            if self.customer == CustomerId::for_coupon(self.coupon_number) {
                self.customer = CustomerId::for_coupon(coupon);
            }
            self.coupon_number = coupon;
        }
        Ok(())
    }

    fn handle_action(&mut self, action: OrderAction) -> Result<StatusChange, OrderError> {
        let from = self.status;
        let sending_back = matches!(action, OrderAction::SendBack);
        let to = match action {
            OrderAction::SetStatus(status) => status,
            OrderAction::Advance => from.next().ok_or_else(|| {
                OrderError::Validation(format!("a {from} order cannot advance any further"))
            })?,
            OrderAction::SendBack => OrderStatus::Preparing,
        };

        let transition = from.transition_to(to)?;
        if sending_back && transition != Transition::SendBack {
            return Err(OrderError::InvalidTransition { from, to });
        }

        self.status = to;
        Ok(StatusChange {
            from,
            to,
            transition,
        })
    }

    fn check_conflict(&self, other: &Self) -> Result<(), OrderError> {
        if self.shares_coupon_with(other) {
            return Err(OrderError::DuplicateCoupon(self.coupon_number));
        }
        Ok(())
    }

    /// Completed and archived orders have left the board.
    fn is_retired(&self) -> bool {
        self.status.is_terminal()
    }
}

fn validate_items(items: &[OrderItem]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::Validation("an order needs at least one item".to_string()));
    }
    if let Some(item) = items.iter().find(|item| item.quantity == 0) {
        return Err(OrderError::Validation(format!("{} has a zero quantity", item.name)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CouponNumber;

    fn preparing(coupon: u32) -> Order {
        Order::from_create_params("order_1".to_string(), OrderCreate::coupon(coupon)).unwrap()
    }

    #[test]
    fn create_derives_owner_from_coupon() {
        let order = preparing(42);
        assert_eq!(order.status, OrderStatus::Preparing);
        assert_eq!(order.customer, CustomerId::new("student-42"));
    }

    #[test]
    fn create_rejects_late_start_and_empty_items() {
        let late = OrderCreate::coupon(1).starting_at(OrderStatus::Ready);
        assert!(matches!(
            Order::from_create_params("x".to_string(), late),
            Err(OrderError::Validation(_))
        ));

        let empty = OrderCreate::coupon(1).with_items(Vec::new());
        assert!(Order::from_create_params("x".to_string(), empty).is_err());

        let zero = OrderCreate::coupon(1).with_items(vec![OrderItem::new("Tea", 0)]);
        assert!(Order::from_create_params("x".to_string(), zero).is_err());
    }

    #[test]
    fn coupon_edit_moves_derived_owner_only() {
        let mut order = preparing(42);
        order
            .on_update(OrderPatch {
                coupon_number: Some(CouponNumber(43)),
                ..OrderPatch::default()
            })
            .unwrap();
        assert_eq!(order.customer, CustomerId::new("student-43"));

        let mut owned = Order::from_create_params(
            "order_2".to_string(),
            OrderCreate::coupon(7).for_customer(CustomerId::new("ana")),
        )
        .unwrap();
        owned
            .on_update(OrderPatch {
                coupon_number: Some(CouponNumber(8)),
                ..OrderPatch::default()
            })
            .unwrap();
        assert_eq!(owned.customer, CustomerId::new("ana"));
        assert_eq!(owned.coupon_number, CouponNumber(8));
    }

    #[test]
    fn advance_walks_the_lifecycle() {
        let mut order = Order::from_create_params(
            "order_1".to_string(),
            OrderCreate::coupon(5).starting_at(OrderStatus::Pending),
        )
        .unwrap();

        for expected in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Completed] {
            let change = order.handle_action(OrderAction::Advance).unwrap();
            assert_eq!(change.to, expected);
            assert_eq!(change.transition, Transition::Advance);
        }
        assert!(order.is_retired());
        assert!(matches!(
            order.handle_action(OrderAction::Advance),
            Err(OrderError::Validation(_))
        ));
    }

    #[test]
    fn skipping_and_regressing_are_rejected() {
        let mut order = preparing(5);
        assert_eq!(
            order.handle_action(OrderAction::SetStatus(OrderStatus::Completed)),
            Err(OrderError::InvalidTransition {
                from: OrderStatus::Preparing,
                to: OrderStatus::Completed
            })
        );
        assert_eq!(
            order.handle_action(OrderAction::SendBack),
            Err(OrderError::InvalidTransition {
                from: OrderStatus::Preparing,
                to: OrderStatus::Preparing
            })
        );
        assert_eq!(order.status, OrderStatus::Preparing);
    }

    #[test]
    fn send_back_returns_ready_order_to_kitchen() {
        let mut order = preparing(5);
        order.handle_action(OrderAction::Advance).unwrap();
        let change = order.handle_action(OrderAction::SendBack).unwrap();
        assert_eq!(change.transition, Transition::SendBack);
        assert_eq!(order.status, OrderStatus::Preparing);
    }

    #[test]
    fn duplicate_coupon_conflicts_while_active() {
        let first = preparing(42);
        let mut second = first.clone();
        second.id = "order_2".to_string();
        assert_eq!(
            second.check_conflict(&first),
            Err(OrderError::DuplicateCoupon(CouponNumber(42)))
        );

        second.status = OrderStatus::Completed;
        assert!(second.check_conflict(&first).is_ok());
    }
}
