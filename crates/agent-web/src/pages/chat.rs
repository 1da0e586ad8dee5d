//! Chat Page

use leptos::prelude::*;

use crate::api;
use crate::components::MessageBubble;

#[component]
pub fn ChatPage() -> impl IntoView {
    let (messages, set_messages) = signal(Vec::<api::ChatMessage>::new());
    let (input, set_input) = signal(String::new());
    let (loading, set_loading) = signal(false);
    let (session_id, set_session_id) = signal(None::<String>);

    let push = move |role: &str, content: String| {
        set_messages.update(|msgs| {
            let id = msgs.len();
            msgs.push(api::ChatMessage {
                id,
                role: role.into(),
                content,
                checkout_url: None,
                qr_code: None,
            });
        });
    };

    let send = move || {
        let msg = input.get();
        if msg.trim().is_empty() || loading.get() {
            return;
        }

        push("user", msg.clone());
        set_input.set(String::new());
        set_loading.set(true);

        let session = session_id.get();
        let reply_id = messages.with(Vec::len);
        leptos::task::spawn_local(async move {
            match api::send_chat(&msg, session.as_deref(), reply_id).await {
                Ok(reply) => {
                    set_session_id.set(Some(reply.session_id));
                    set_messages.update(|msgs| msgs.push(reply.message));
                }
                Err(e) => push("error", e),
            }
            set_loading.set(false);
        });
    };

    view! {
        <div class="chat">
            <header class="chat-header">
                <h1>"Stripe Agent"</h1>
                <p class="hint">
                    "Try: Create a payment link for a new product called \"Test\" with a price of $100."
                </p>
            </header>

            <main class="chat-main">
                <div class="messages">
                    <For
                        each=move || messages.get()
                        key=|msg| msg.id
                        children=move |msg| view! { <MessageBubble message=msg /> }
                    />
                    <Show when=move || loading.get()>
                        <div class="message loading">"..."</div>
                    </Show>
                </div>

                <div class="input-area">
                    <textarea
                        placeholder="Describe the product and price..."
                        prop:value=move || input.get()
                        on:input=move |ev| set_input.set(event_target_value(&ev))
                        on:keydown=move |ev| {
                            if ev.key() == "Enter" && !ev.shift_key() {
                                ev.prevent_default();
                                send();
                            }
                        }
                    />
                    <button on:click=move |_| send() disabled=move || loading.get()>
                        {move || if loading.get() { "..." } else { "Send" }}
                    </button>
                </div>
            </main>
        </div>
    }
}
