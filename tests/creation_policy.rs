//! End-to-end scenarios through the public fixture API, built around a
//! small gift-card domain that exercises every creation policy.

use aggregate_testkit::{
    AggregateTestFixture, CommandMessage, CreationPolicy, DispatchFailure, EventMessage,
    FixtureError, HandlerKind, HandlerOutput,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
struct CardId(Uuid);

impl CardId {
    fn random() -> Self {
        CardId(Uuid::new_v4())
    }
}

#[derive(Debug, Default)]
struct GiftCard {
    id: Option<CardId>,
    balance: i64,
}

impl aggregate_testkit::Aggregate for GiftCard {
    type Id = CardId;
    type Command = CardCommand;
    type Event = CardEvent;
}

#[derive(Debug, Clone)]
enum CardCommand {
    /// Constructor-style, no declared policy.
    Issue { id: CardId, amount: i64 },
    /// `NEVER`: only acts on an existing card.
    Redeem { id: CardId, amount: i64 },
    /// `CREATE_IF_MISSING`: creates lazily, acts either way.
    Reload { id: CardId, amount: i64 },
    /// `ALWAYS`: starts a fresh lifecycle, prior state must not leak.
    Reissue { id: CardId, amount: i64 },
}

impl CommandMessage for CardCommand {
    type Id = CardId;

    fn command_type(&self) -> &'static str {
        match self {
            CardCommand::Issue { .. } => "Issue",
            CardCommand::Redeem { .. } => "Redeem",
            CardCommand::Reload { .. } => "Reload",
            CardCommand::Reissue { .. } => "Reissue",
        }
    }

    fn target(&self) -> CardId {
        match self {
            CardCommand::Issue { id, .. }
            | CardCommand::Redeem { id, .. }
            | CardCommand::Reload { id, .. }
            | CardCommand::Reissue { id, .. } => id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum CardEvent {
    Issued { id: CardId, amount: i64 },
    Redeemed { id: CardId, amount: i64 },
    Reloaded { id: CardId, amount: i64 },
}

impl EventMessage for CardEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CardEvent::Issued { .. } => "Issued",
            CardEvent::Redeemed { .. } => "Redeemed",
            CardEvent::Reloaded { .. } => "Reloaded",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("insufficient balance: tried to redeem {requested} from {available}")]
struct InsufficientBalance {
    requested: i64,
    available: i64,
}

fn fixture() -> AggregateTestFixture<GiftCard> {
    AggregateTestFixture::new()
        .register_sourcing_handler("Issued", |card: &mut GiftCard, event| {
            if let CardEvent::Issued { id, amount } = event {
                card.id = Some(id.clone());
                card.balance = *amount;
            }
        })
        .register_sourcing_handler("Redeemed", |card: &mut GiftCard, event| {
            if let CardEvent::Redeemed { amount, .. } = event {
                card.balance -= amount;
            }
        })
        .register_sourcing_handler("Reloaded", |card: &mut GiftCard, event| {
            if let CardEvent::Reloaded { id, amount } = event {
                card.id = Some(id.clone());
                card.balance += amount;
            }
        })
        .register_command_handler(
            "Issue",
            HandlerKind::Instantiating,
            None,
            |cmd, ctx| {
                if let CardCommand::Issue { id, amount } = cmd {
                    ctx.apply(CardEvent::Issued {
                        id: id.clone(),
                        amount: *amount,
                    })?;
                }
                Ok(HandlerOutput::Void)
            },
        )
        .register_command_handler(
            "Redeem",
            HandlerKind::InstanceScoped,
            Some(CreationPolicy::Never),
            |cmd, ctx| {
                let CardCommand::Redeem { id, amount } = cmd else {
                    unreachable!("routed by command type");
                };
                if *amount > ctx.state().balance {
                    return Err(aggregate_testkit::HandlerError::domain(
                        InsufficientBalance {
                            requested: *amount,
                            available: ctx.state().balance,
                        },
                    ));
                }
                ctx.apply(CardEvent::Redeemed {
                    id: id.clone(),
                    amount: *amount,
                })?;
                Ok(HandlerOutput::Void)
            },
        )
        .register_command_handler(
            "Reload",
            HandlerKind::InstanceScoped,
            Some(CreationPolicy::CreateIfMissing),
            |cmd, ctx| {
                if let CardCommand::Reload { id, amount } = cmd {
                    ctx.apply(CardEvent::Reloaded {
                        id: id.clone(),
                        amount: *amount,
                    })?;
                }
                Ok(HandlerOutput::Void)
            },
        )
        .register_command_handler(
            "Reissue",
            HandlerKind::InstanceScoped,
            Some(CreationPolicy::Always),
            |cmd, ctx| {
                let CardCommand::Reissue { id, amount } = cmd else {
                    unreachable!("routed by command type");
                };
                ctx.apply(CardEvent::Issued {
                    id: id.clone(),
                    amount: *amount,
                })?;
                // The sourcing handler has already run; the balance read
                // here is the post-apply value of the fresh instance.
                let balance = ctx.state().balance;
                Ok(HandlerOutput::Return(serde_json::json!(balance)))
            },
        )
        .register_command_handler_interceptor(|_cmd, hooks| {
            hooks.mark_intercepted();
            Ok(())
        })
}

#[test]
fn issue_creates_a_card_and_returns_its_identifier() {
    let fixture = fixture();
    let id = CardId::random();
    fixture
        .given_no_prior_activity()
        .when(CardCommand::Issue {
            id: id.clone(),
            amount: 50,
        })
        .expect_events([CardEvent::Issued {
            id: id.clone(),
            amount: 50,
        }])
        .expect_result_message_payload(&id)
        .expect_successful_handler_execution()
        .expect_state(|card| assert_eq!(card.balance, 50));
    assert!(fixture.hooks().was_intercepted());
}

#[test]
fn redeem_against_existing_card_succeeds() {
    let fixture = fixture();
    let id = CardId::random();
    fixture
        .given([CardEvent::Issued {
            id: id.clone(),
            amount: 50,
        }])
        .when(CardCommand::Redeem {
            id: id.clone(),
            amount: 20,
        })
        .expect_events([CardEvent::Redeemed { id, amount: 20 }])
        .expect_successful_handler_execution()
        .expect_no_result()
        .expect_state(|card| assert_eq!(card.balance, 30));
}

#[test]
fn redeem_without_prior_activity_is_aggregate_not_found() {
    let fixture = fixture();
    let id = CardId::random();
    fixture
        .given_no_prior_activity()
        .when(CardCommand::Redeem { id, amount: 20 })
        .expect_no_events()
        .expect_exception(|failure| matches!(failure, DispatchFailure::AggregateNotFound));
    // Resolution failed before dispatch started.
    assert!(!fixture.hooks().was_intercepted());
}

#[test]
fn redeem_beyond_balance_fails_with_domain_error() {
    let fixture = fixture();
    let id = CardId::random();
    fixture
        .given([CardEvent::Issued {
            id: id.clone(),
            amount: 10,
        }])
        .when(CardCommand::Redeem { id, amount: 20 })
        .expect_no_events()
        .expect_exception(|failure| {
            matches!(failure, DispatchFailure::HandlerExecution(err)
                if err.to_string().contains("insufficient balance"))
        });
}

#[test]
fn reload_creates_the_card_when_missing() {
    let fixture = fixture();
    let id = CardId::random();
    fixture
        .given_no_prior_activity()
        .when(CardCommand::Reload {
            id: id.clone(),
            amount: 25,
        })
        .expect_events([CardEvent::Reloaded {
            id: id.clone(),
            amount: 25,
        }])
        .expect_successful_handler_execution()
        .expect_state(|card| assert_eq!(card.balance, 25));
}

#[test]
fn reload_produces_the_same_event_for_an_existing_card() {
    let fixture = fixture();
    let id = CardId::random();
    fixture
        .given([CardEvent::Issued {
            id: id.clone(),
            amount: 50,
        }])
        .when(CardCommand::Reload {
            id: id.clone(),
            amount: 25,
        })
        .expect_events([CardEvent::Reloaded {
            id: id.clone(),
            amount: 25,
        }])
        .expect_successful_handler_execution()
        .expect_state(|card| assert_eq!(card.balance, 75));
}

#[test]
fn reissue_never_observes_prior_state() {
    let fixture = fixture();
    let id = CardId::random();

    let from_scratch = fixture
        .given_no_prior_activity()
        .when(CardCommand::Reissue {
            id: id.clone(),
            amount: 100,
        });
    let over_history = fixture
        .given([
            CardEvent::Issued {
                id: id.clone(),
                amount: 50,
            },
            CardEvent::Reloaded {
                id: id.clone(),
                amount: 25,
            },
        ])
        .when(CardCommand::Reissue {
            id: id.clone(),
            amount: 100,
        });

    // Identical events either way: prior state must not leak into the
    // fresh instance.
    assert_eq!(
        from_scratch.outcome().produced_events(),
        over_history.outcome().produced_events()
    );
    over_history
        .expect_result_message_payload(100)
        .expect_state(|card| assert_eq!(card.balance, 100));
}

#[test]
fn interceptor_failure_becomes_the_outcome() {
    #[derive(Debug, thiserror::Error)]
    #[error("card commands are frozen")]
    struct Frozen;

    let fixture = fixture().register_command_handler_interceptor(|_cmd, _hooks| {
        Err(Box::new(Frozen))
    });
    let id = CardId::random();
    fixture
        .given_no_prior_activity()
        .when(CardCommand::Issue { id, amount: 10 })
        .expect_no_events()
        .expect_exception(|failure| {
            matches!(failure, DispatchFailure::HandlerExecution(err)
                if err.to_string().contains("frozen"))
        });
}

#[test]
#[should_panic(expected = "already exists")]
fn issue_cannot_recreate_an_existing_card() {
    let fixture = fixture();
    let id = CardId::random();
    fixture
        .given([CardEvent::Issued {
            id: id.clone(),
            amount: 50,
        }])
        .when(CardCommand::Issue { id, amount: 50 });
}

#[test]
fn standalone_verifier_functions_are_usable_directly() {
    let id = CardId::random();
    let actual = [CardEvent::Issued {
        id: id.clone(),
        amount: 50,
    }];
    let expected = [CardEvent::Issued { id, amount: 60 }];
    let report = aggregate_testkit::verify_events(&actual, &expected)
        .unwrap_err()
        .to_string();
    assert!(report.contains("index 0"));
}

#[test]
fn missing_sourcing_handler_error_display_is_actionable() {
    // Sanity check on the configuration error surfaced by a broken setup.
    let err = FixtureError::MissingEventSourcingHandler {
        event_type: "Issued",
    };
    assert!(err.to_string().contains("Issued"));
}
