/// A newsletter to be dispatched. Built per send request and dropped afterwards.
#[derive(Debug, Clone)]
pub struct NewsletterMessage {
    pub subject: String,
    pub body: String,
    pub call_to_action: Option<CallToAction>,
}

#[derive(Debug, Clone)]
pub struct CallToAction {
    pub url: String,
    pub label: Option<String>,
}

impl NewsletterMessage {
    pub fn parse(
        subject: Option<String>,
        body: Option<String>,
        link_url: Option<String>,
        link_text: Option<String>,
    ) -> Result<Self, String> {
        let subject = non_blank(subject).ok_or("The newsletter subject is required.")?;
        let body = non_blank(body).ok_or("The newsletter content is required.")?;
        let call_to_action = non_blank(link_url).map(|url| CallToAction {
            url,
            label: non_blank(link_text),
        });

        Ok(Self {
            subject,
            body,
            call_to_action,
        })
    }

    pub fn link_url(&self) -> Option<&str> {
        self.call_to_action.as_ref().map(|cta| cta.url.as_str())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
