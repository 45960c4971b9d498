use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use scheduling_cell::models::{
    AppointmentStatus, Block, BookAppointmentRequest, SchedulingError, ServiceOffering,
};
use scheduling_cell::services::booking::BookingService;
use scheduling_cell::store::{InMemoryStore, SchedulingStore};

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    monday().and_hms_opt(hour, min, 0).unwrap().and_utc()
}

struct Fixture {
    store: Arc<InMemoryStore>,
    booking: BookingService,
    professional_id: Uuid,
    haircut_30: Uuid,
    color_45: Uuid,
}

fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let professional_id = Uuid::new_v4();
    store.add_professional(professional_id);

    let haircut_30 = Uuid::new_v4();
    store.add_service(ServiceOffering {
        id: haircut_30,
        name: "Haircut".to_string(),
        duration_minutes: 30,
        price: 45.0,
        active: true,
    });

    let color_45 = Uuid::new_v4();
    store.add_service(ServiceOffering {
        id: color_45,
        name: "Coloring".to_string(),
        duration_minutes: 45,
        price: 120.0,
        active: true,
    });

    let booking = BookingService::new(Arc::clone(&store) as Arc<dyn SchedulingStore>);
    Fixture {
        store,
        booking,
        professional_id,
        haircut_30,
        color_45,
    }
}

fn book_request(fx: &Fixture, service_id: Uuid, starts_at: DateTime<Utc>) -> BookAppointmentRequest {
    BookAppointmentRequest {
        client_id: Uuid::new_v4(),
        professional_id: fx.professional_id,
        service_id,
        starts_at,
        notes: None,
    }
}

// ==============================================================================
// CREATE
// ==============================================================================

#[tokio::test]
async fn booking_derives_duration_and_price_from_service() {
    let fx = fixture();

    let appointment = fx
        .booking
        .book_appointment(book_request(&fx, fx.color_45, at(10, 0)))
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.duration_minutes, 45);
    assert_eq!(appointment.price, 120.0);
    assert_eq!(appointment.ends_at(), at(10, 45));
}

#[tokio::test]
async fn overlapping_booking_for_same_professional_is_rejected() {
    let fx = fixture();

    fx.booking
        .book_appointment(book_request(&fx, fx.color_45, at(10, 0)))
        .await
        .unwrap();

    // 10:00-10:30 intersects the existing 10:00-10:45 appointment.
    let result = fx
        .booking
        .book_appointment(book_request(&fx, fx.haircut_30, at(10, 0)))
        .await;
    assert_matches!(result, Err(SchedulingError::SlotConflict));

    // A different professional is free to take the same interval.
    let other_professional = Uuid::new_v4();
    fx.store.add_professional(other_professional);
    let mut request = book_request(&fx, fx.haircut_30, at(10, 0));
    request.professional_id = other_professional;
    assert!(fx.booking.book_appointment(request).await.is_ok());
}

#[tokio::test]
async fn back_to_back_bookings_are_allowed() {
    let fx = fixture();

    fx.booking
        .book_appointment(book_request(&fx, fx.haircut_30, at(10, 0)))
        .await
        .unwrap();

    // Starts exactly when the previous one ends.
    let result = fx
        .booking
        .book_appointment(book_request(&fx, fx.haircut_30, at(10, 30)))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn booking_over_a_block_is_rejected() {
    let fx = fixture();
    fx.store.add_block(Block {
        id: Uuid::new_v4(),
        professional_id: Some(fx.professional_id),
        starts_at: at(14, 0),
        ends_at: at(15, 0),
        reason: None,
    });

    let result = fx
        .booking
        .book_appointment(book_request(&fx, fx.haircut_30, at(14, 30)))
        .await;
    assert_matches!(result, Err(SchedulingError::SlotConflict));
}

#[tokio::test]
async fn multi_day_booking_collides_with_middle_day_appointments() {
    let fx = fixture();

    // Existing 30-minute booking on the Tuesday.
    let tuesday_noon = NaiveDate::from_ymd_opt(2025, 6, 3)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        .and_utc();
    fx.booking
        .book_appointment(book_request(&fx, fx.haircut_30, tuesday_noon))
        .await
        .unwrap();

    // A 48-hour booking from Monday 10:00 spans that whole Tuesday and must
    // collide even though neither endpoint falls on it.
    let bridal_package = Uuid::new_v4();
    fx.store.add_service(ServiceOffering {
        id: bridal_package,
        name: "Bridal package".to_string(),
        duration_minutes: 48 * 60,
        price: 900.0,
        active: true,
    });

    let result = fx
        .booking
        .book_appointment(book_request(&fx, bridal_package, at(10, 0)))
        .await;
    assert_matches!(result, Err(SchedulingError::SlotConflict));
}

#[tokio::test]
async fn cancelled_appointment_frees_its_interval() {
    let fx = fixture();

    let appointment = fx
        .booking
        .book_appointment(book_request(&fx, fx.haircut_30, at(10, 0)))
        .await
        .unwrap();
    fx.booking.cancel(appointment.id, None).await.unwrap();

    let result = fx
        .booking
        .book_appointment(book_request(&fx, fx.haircut_30, at(10, 0)))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn unknown_service_or_professional_is_not_found() {
    let fx = fixture();

    let result = fx
        .booking
        .book_appointment(book_request(&fx, Uuid::new_v4(), at(10, 0)))
        .await;
    assert_matches!(result, Err(SchedulingError::NotFound(_)));

    let mut request = book_request(&fx, fx.haircut_30, at(10, 0));
    request.professional_id = Uuid::new_v4();
    let result = fx.booking.book_appointment(request).await;
    assert_matches!(result, Err(SchedulingError::NotFound(_)));
}

#[tokio::test]
async fn inactive_service_is_invalid_input() {
    let fx = fixture();
    let retired = Uuid::new_v4();
    fx.store.add_service(ServiceOffering {
        id: retired,
        name: "Perm".to_string(),
        duration_minutes: 60,
        price: 90.0,
        active: false,
    });

    let result = fx
        .booking
        .book_appointment(book_request(&fx, retired, at(10, 0)))
        .await;
    assert_matches!(result, Err(SchedulingError::InvalidInput(_)));
}

// ==============================================================================
// TRANSITIONS
// ==============================================================================

#[tokio::test]
async fn full_lifecycle_path_reaches_completed() {
    let fx = fixture();
    let appointment = fx
        .booking
        .book_appointment(book_request(&fx, fx.haircut_30, at(10, 0)))
        .await
        .unwrap();

    for status in [
        AppointmentStatus::Confirmed,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
    ] {
        let updated = fx.booking.transition(appointment.id, status).await.unwrap();
        assert_eq!(updated.status, status);
    }
}

#[tokio::test]
async fn illegal_transition_leaves_stored_status_untouched() {
    let fx = fixture();
    let appointment = fx
        .booking
        .book_appointment(book_request(&fx, fx.haircut_30, at(10, 0)))
        .await
        .unwrap();

    fx.booking
        .transition(appointment.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();
    fx.booking
        .transition(appointment.id, AppointmentStatus::InProgress)
        .await
        .unwrap();
    fx.booking
        .transition(appointment.id, AppointmentStatus::Completed)
        .await
        .unwrap();

    // Completed is terminal: trying to reopen it must fail and leave the
    // stored record as it was.
    let result = fx
        .booking
        .transition(appointment.id, AppointmentStatus::Confirmed)
        .await;
    assert_matches!(result, Err(SchedulingError::InvalidTransition(_)));

    let stored = fx.booking.get_appointment(appointment.id).await.unwrap();
    assert_eq!(stored.status, AppointmentStatus::Completed);
}

#[tokio::test]
async fn transition_on_missing_appointment_is_not_found() {
    let fx = fixture();
    let result = fx
        .booking
        .transition(Uuid::new_v4(), AppointmentStatus::Confirmed)
        .await;
    assert_matches!(result, Err(SchedulingError::NotFound(_)));
}

#[tokio::test]
async fn cancel_records_reason_in_notes() {
    let fx = fixture();
    let appointment = fx
        .booking
        .book_appointment(book_request(&fx, fx.haircut_30, at(10, 0)))
        .await
        .unwrap();

    let cancelled = fx
        .booking
        .cancel(appointment.id, Some("client called in sick".to_string()))
        .await
        .unwrap();

    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    assert_eq!(cancelled.notes.as_deref(), Some("client called in sick"));
}

// ==============================================================================
// RESCHEDULE
// ==============================================================================

#[tokio::test]
async fn reschedule_moves_start_and_keeps_status_and_duration() {
    let fx = fixture();
    let appointment = fx
        .booking
        .book_appointment(book_request(&fx, fx.color_45, at(10, 0)))
        .await
        .unwrap();
    fx.booking
        .transition(appointment.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();

    let moved = fx.booking.reschedule(appointment.id, at(15, 0)).await.unwrap();

    assert_eq!(moved.starts_at, at(15, 0));
    assert_eq!(moved.duration_minutes, 45);
    assert_eq!(moved.status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn reschedule_excludes_the_appointments_own_interval() {
    let fx = fixture();
    let appointment = fx
        .booking
        .book_appointment(book_request(&fx, fx.color_45, at(10, 0)))
        .await
        .unwrap();

    // Shifting 15 minutes later overlaps the old interval, which must not
    // count against itself.
    let moved = fx.booking.reschedule(appointment.id, at(10, 15)).await.unwrap();
    assert_eq!(moved.starts_at, at(10, 15));
}

#[tokio::test]
async fn reschedule_into_another_appointment_is_rejected() {
    let fx = fixture();
    fx.booking
        .book_appointment(book_request(&fx, fx.haircut_30, at(11, 0)))
        .await
        .unwrap();
    let appointment = fx
        .booking
        .book_appointment(book_request(&fx, fx.haircut_30, at(9, 0)))
        .await
        .unwrap();

    let result = fx.booking.reschedule(appointment.id, at(11, 15)).await;
    assert_matches!(result, Err(SchedulingError::SlotConflict));

    let stored = fx.booking.get_appointment(appointment.id).await.unwrap();
    assert_eq!(stored.starts_at, at(9, 0));
}

#[tokio::test]
async fn terminal_appointment_cannot_be_rescheduled() {
    let fx = fixture();
    let appointment = fx
        .booking
        .book_appointment(book_request(&fx, fx.haircut_30, at(10, 0)))
        .await
        .unwrap();
    fx.booking.cancel(appointment.id, None).await.unwrap();

    let result = fx.booking.reschedule(appointment.id, at(15, 0)).await;
    assert_matches!(result, Err(SchedulingError::InvalidTransition(_)));
}

// ==============================================================================
// CONCURRENCY
// ==============================================================================

#[tokio::test]
async fn concurrent_transitions_to_terminal_states_admit_exactly_one() {
    let fx = fixture();
    let appointment = fx
        .booking
        .book_appointment(book_request(&fx, fx.haircut_30, at(10, 0)))
        .await
        .unwrap();
    fx.booking
        .transition(appointment.id, AppointmentStatus::Confirmed)
        .await
        .unwrap();
    fx.booking
        .transition(appointment.id, AppointmentStatus::InProgress)
        .await
        .unwrap();

    // Completing and cancelling race; the loser must see the terminal state
    // and fail instead of overwriting it.
    let (a, b) = tokio::join!(
        fx.booking
            .transition(appointment.id, AppointmentStatus::Completed),
        fx.booking
            .transition(appointment.id, AppointmentStatus::Cancelled)
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(SchedulingError::InvalidTransition(_)))));

    let stored = fx.booking.get_appointment(appointment.id).await.unwrap();
    assert!(stored.status.is_terminal());
}

#[tokio::test]
async fn concurrent_identical_bookings_admit_exactly_one() {
    let fx = fixture();

    let first = book_request(&fx, fx.haircut_30, at(10, 0));
    let second = book_request(&fx, fx.haircut_30, at(10, 0));

    let (a, b) = tokio::join!(
        fx.booking.book_appointment(first),
        fx.booking.book_appointment(second)
    );

    let outcomes = [a, b];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(SchedulingError::SlotConflict))));
}
