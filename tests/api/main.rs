mod newsletter;
mod unsubscribe;
