//! Outgoing customer notifications.
//!
//! Builds the plain-text messages and hands them to the configured mail
//! adapter. Delivery is best-effort: failures are logged and swallowed so a
//! slow or broken relay never undoes an order or a price update.

use adapters::{MailAdapter, MailKind, OutgoingMail};

use crate::database::models::{CartLine, Observer, Order, SellerStatus};
use crate::views::format_cents;

pub fn order_confirmation(order: &Order, lines: &[CartLine]) -> OutgoingMail {
    let mut body = format!("Thank you for your order #{}!\n\n", order.id);
    for line in lines {
        body.push_str(&format!(
            "  {} x {} @ {} = {}\n",
            line.quantity,
            line.name,
            format_cents(line.unit_price_cents),
            format_cents(line.line_total_cents)
        ));
    }
    body.push_str(&format!("\nTotal: {}\n", format_cents(order.total_cents)));
    body.push_str("\nWe will let you know when your parcel ships.\n");

    OutgoingMail::new(
        MailKind::OrderConfirmation,
        order.email.clone(),
        format!("FunShop order #{} confirmed", order.id),
        body,
    )
}

pub fn price_change(observer: &Observer, product_name: &str, new_price_cents: i64) -> OutgoingMail {
    let direction = if new_price_cents < observer.observed_price_cents {
        "dropped"
    } else {
        "changed"
    };
    OutgoingMail::new(
        MailKind::PriceChange,
        observer.email.clone(),
        format!("Price {direction}: {product_name}"),
        format!(
            "Hi {},\n\nthe price of {} {} from {} to {}.\n",
            observer.name,
            product_name,
            direction,
            format_cents(observer.observed_price_cents),
            format_cents(new_price_cents)
        ),
    )
}

pub fn seller_decision(email: &str, shop_name: &str, status: SellerStatus) -> OutgoingMail {
    let body = match status {
        SellerStatus::Approved => format!(
            "Good news: {shop_name} is approved. You can now list products on FunShop.\n"
        ),
        _ => format!("Your seller application for {shop_name} was not approved.\n"),
    };
    OutgoingMail::new(
        MailKind::SellerDecision,
        email,
        format!("Your FunShop seller application: {status}"),
        body,
    )
}

/// Send one message, logging instead of failing.
pub async fn deliver(mailer: &dyn MailAdapter, mail: OutgoingMail) {
    match mailer.send(&mail).await {
        Ok(()) => tracing::info!(
            transport = mailer.name(),
            kind = mail.kind.as_str(),
            "mail sent"
        ),
        Err(err) if err.is_transient() => tracing::warn!(
            transport = mailer.name(),
            kind = mail.kind.as_str(),
            error = %err,
            "mail delivery failed, transport may recover"
        ),
        Err(err) => tracing::error!(
            transport = mailer.name(),
            kind = mail.kind.as_str(),
            error = %err,
            "mail delivery failed"
        ),
    }
}
