//! UI Components

use leptos::prelude::*;

use crate::api::ChatMessage;

/// On-screen size of checkout QR codes, in CSS pixels
const QR_DISPLAY_SIZE: &str = "240";

/// Message bubble component
#[component]
pub fn MessageBubble(message: ChatMessage) -> impl IntoView {
    let class = format!("message message-{}", message.role);
    let checkout = message.checkout_url.clone().zip(message.qr_code.clone());

    view! {
        <div class=class>
            <span class="role">{message.role.clone()}</span>
            <p class="content">{message.content.clone()}</p>
            {checkout.map(|(url, qr)| view! { <CheckoutQr url=url qr=qr /> })}
        </div>
    }
}

/// Scannable checkout link
#[component]
pub fn CheckoutQr(url: String, qr: String) -> impl IntoView {
    let href = url.clone();
    view! {
        <figure class="checkout-qr">
            <img src=qr alt="Scan to pay" width=QR_DISPLAY_SIZE height=QR_DISPLAY_SIZE />
            <figcaption>
                <a href=href target="_blank" rel="noopener">{url}</a>
            </figcaption>
        </figure>
    }
}
