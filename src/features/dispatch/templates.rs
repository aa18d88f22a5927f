//! Message templates.
//!
//! One template per visit type plus the dose reminder and the escalation
//! notice. Adding a visit type without a template is a compile error: the
//! registry is an exhaustive match over the closed `VisitType` sum.

use crate::features::followups::VisitType;
use crate::features::reminders::Reminder;
use chrono::NaiveDateTime;

/// Render the medication reminder for one dose slot.
pub fn dose_reminder(patient_name: &str, reminder: &Reminder, slot: NaiveDateTime) -> String {
    let mut message = String::new();
    message.push_str("💊 **MEDICATION REMINDER**\n\n");
    message.push_str(&format!("Hello {patient_name}!\n\n"));
    message.push_str("⏰ **Time for your medication:**\n");
    message.push_str(&format!("• **Medication:** {}\n", reminder.medication_name));
    message.push_str(&format!("• **Dosage:** {}\n", reminder.dosage));
    message.push_str(&format!(
        "• **Scheduled Time:** {}\n\n",
        slot.format("%I:%M %p")
    ));

    if let Some(instructions) = reminder
        .special_instructions
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        message.push_str("📋 **Special Instructions:**\n");
        message.push_str(instructions);
        message.push_str("\n\n");
    }

    message.push_str("📱 **Please reply with:**\n");
    message.push_str("✅ **TAKEN** - if you've taken your medication\n");
    message.push_str("⏰ **DELAYED** - if you'll take it later\n");
    message.push_str("❌ **MISSED** - if you can't take it today\n");
    message.push_str("🤔 **HELP** - if you have questions\n\n");
    message.push_str("🏥 *Your health matters to us!*\n");
    message.push_str("*This is an automated reminder from CarePulse*");
    message
}

/// Render the check-in message for a follow-up, keyed by visit type.
pub fn follow_up(visit_type: VisitType, patient_name: &str) -> String {
    let template = match visit_type {
        VisitType::RoutineCheckup => {
            "Hello {patientName}! 👋\n\nWe hope you're feeling well after your routine checkup. \
             How are you feeling today? Any concerns or questions about your visit?\n\nReply:\n\
             ✅ GOOD - if you're feeling fine\n❓ QUESTIONS - if you have concerns\n\n\
             Your health matters to us! 💙"
        }
        VisitType::NewMedication => {
            "Hi {patientName}! 💊\n\nIt's been 24 hours since you started your new medication. \
             How are you feeling?\n\nPlease let us know:\n✅ GOOD - no side effects\n\
             ⚠️ MILD - minor side effects\n🚨 SEVERE - concerning symptoms\n\n\
             Your safety is our priority!"
        }
        VisitType::PostSurgery => {
            "Hello {patientName}! 🏥\n\nWe're checking on your recovery after your procedure. \
             How are you feeling?\n\nPlease update us:\n✅ GOOD - healing well\n\
             😟 PAIN - experiencing discomfort\n🚨 URGENT - need immediate attention\n\n\
             We're here to support your recovery!"
        }
        VisitType::ChronicCare => {
            "Hi {patientName}! 🩺\n\nJust checking in on your ongoing care. How have you been \
             managing your condition?\n\nReply:\n✅ STABLE - feeling well\n\
             📈 WORSE - symptoms increasing\n❓ QUESTIONS - need guidance\n\n\
             Stay strong, we're with you!"
        }
        VisitType::EmergencyFollowUp => {
            "URGENT: Hello {patientName}! 🚨\n\nWe're following up on your emergency visit. \
             This is important - how are you feeling right now?\n\nPlease respond immediately:\n\
             ✅ STABLE - feeling better\n⚠️ SAME - no improvement\n🚨 WORSE - condition declining\n\n\
             Your immediate response is needed!"
        }
        VisitType::LabResults => {
            "Hi {patientName}! 🧪\n\nYour lab results are in! We're following up to discuss them \
             with you.\n\nReply:\n✅ READY - ready to discuss results\n\
             📞 CALL - prefer phone consultation\n❓ QUESTIONS - have specific concerns\n\n\
             Your health insights await!"
        }
        VisitType::WellnessCheck => {
            "Hello {patientName}! 🌿\n\nTime for your wellness check! Let's review your health \
             goals and preventive care.\n\nReply:\n✅ READY - ready for check-up\n\
             📞 RESCHEDULE - need different time\n❓ QUESTIONS - have health concerns\n\n\
             Staying healthy together!"
        }
    };
    template.replace("{patientName}", patient_name)
}

/// Render the urgent notice sent when a follow-up goes unanswered past the
/// grace period. Distinct from the original template on purpose.
pub fn escalation(patient_name: &str) -> String {
    format!(
        "🚨 IMPORTANT: Hello {patient_name}!\n\n\
         We sent you a health follow-up message 48 hours ago but haven't heard back. \
         Your health and well-being are important to us.\n\n\
         Please respond with:\n\
         ✅ OK - if you're fine\n\
         📞 CALL - if you need to speak with us\n\
         🚨 URGENT - if you need immediate help\n\n\
         We care about you and want to ensure you're okay."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reminders::Frequency;
    use crate::store::PatientId;
    use chrono::NaiveDate;

    #[test]
    fn dose_reminder_includes_medication_details_and_prompt() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut reminder = Reminder::new(
            PatientId(1),
            "Metformin",
            "500mg",
            Frequency::TwiceDaily,
            start,
            3,
            "dr-lee",
            start,
        );
        reminder.special_instructions = Some("Take with food".into());

        let slot = start.date().and_hms_opt(8, 0, 0).unwrap();
        let body = dose_reminder("Asha Rao", &reminder, slot);

        assert!(body.contains("Hello Asha Rao!"));
        assert!(body.contains("Metformin"));
        assert!(body.contains("500mg"));
        assert!(body.contains("08:00 AM"));
        assert!(body.contains("Take with food"));
        for keyword in ["TAKEN", "DELAYED", "MISSED", "HELP"] {
            assert!(body.contains(keyword), "missing reply keyword {keyword}");
        }
    }

    #[test]
    fn every_visit_type_substitutes_the_patient_name() {
        for visit_type in VisitType::ALL {
            let body = follow_up(visit_type, "Asha Rao");
            assert!(body.contains("Asha Rao"), "{visit_type:?}");
            assert!(!body.contains("{patientName}"), "{visit_type:?}");
        }
    }

    #[test]
    fn escalation_is_distinct_from_the_original_templates() {
        let body = escalation("Asha Rao");
        assert!(body.contains("haven't heard back"));
        for visit_type in VisitType::ALL {
            assert_ne!(body, follow_up(visit_type, "Asha Rao"));
        }
    }
}
