//! Auto-reply notifier — composes the canned reply and hands it to the
//! configured transport.

use std::sync::Arc;

use tracing::{info, warn};

use crate::channels::{OutgoingEmail, SenderIdentity, Transport};
use crate::pipeline::types::DeliveryOutcome;

/// Subject line of every auto-reply.
pub const REPLY_SUBJECT: &str = "Re: Solicitud de información - Auditoría";

/// Sends the canned reply to good leads.
pub struct Notifier {
    transport: Arc<dyn Transport>,
    sender: SenderIdentity,
}

impl Notifier {
    pub fn new(transport: Arc<dyn Transport>, sender: SenderIdentity) -> Self {
        Self { transport, sender }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn sender(&self) -> &SenderIdentity {
        &self.sender
    }

    /// Send the auto-reply. Failures come back in the outcome, never as `Err`.
    pub async fn notify(&self, recipient_email: &str, recipient_name: &str) -> DeliveryOutcome {
        let email = OutgoingEmail {
            from: self.sender.clone(),
            to: recipient_email.to_string(),
            subject: REPLY_SUBJECT.to_string(),
            text: compose_reply(recipient_name, &self.sender.name),
        };

        match self.transport.send(&email).await {
            Ok(()) => {
                info!(
                    to = %recipient_email,
                    transport = self.transport.name(),
                    "Auto-reply sent"
                );
                DeliveryOutcome::delivered()
            }
            Err(e) => {
                warn!(
                    to = %recipient_email,
                    transport = self.transport.name(),
                    error = %e,
                    "Auto-reply failed"
                );
                DeliveryOutcome::failed(e.to_string())
            }
        }
    }
}

/// Plain-text body of the auto-reply.
pub fn compose_reply(recipient_name: &str, sender_name: &str) -> String {
    format!(
        "Hola {recipient_name},\n\
         \n\
         Gracias por contactar con nosotros.\n\
         \n\
         Para poder orientarle correctamente, ¿podría indicarnos:\n\
         - Tipo de empresa y sector\n\
         - Qué necesita exactamente (auditoría, revisión, etc.)\n\
         - Plazo o fecha objetivo\n\
         \n\
         En cuanto recibamos estos datos, le propondremos una llamada breve para profundizar.\n\
         \n\
         Un saludo cordial,\n\
         {sender_name}\n"
    )
}
