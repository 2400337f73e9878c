use crate::api::attendance::AttendanceQuery;
use crate::api::leave_draft::{DraftView, DropdownReq};
use crate::api::leave_request::LeaveFilter;
use crate::leave::backend::SubmissionReceipt;
use crate::leave::draft::{ActiveDropdown, DraftRequest};
use crate::leave::payload::NormalizedRequest;
use crate::leave::validator::ComputedBalance;
use crate::model::attendance::{Attendance, GeoPoint};
use crate::model::entitlement::{EntitlementBalance, EntitlementRecord};
use crate::model::leave_category::LeaveCategory;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::report::{AttendanceSummary, DateRangeQuery, LeaveCategorySummary};
use crate::utils::pagination::{AttendancePage, LeavePage};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Leave & Attendance API",
        version = "1.0.0",
        description = r#"
## Leave & Attendance service

Backs the employee self-service mobile app.

### Key Features
- **Leave drafts**
  - Open a draft, edit it field by field and watch the balance update live
  - Submission is single-flight: a draft can only be in one submit at a time
- **Leave management**
  - Categories, balances, history, approve/reject for HR
- **Attendance**
  - Geotagged check-in/check-out, history and monthly summaries

### Security
All endpoints expect an access token issued by the auth service
(`Authorization: Bearer <token>`).
"#,
    ),
    paths(
        crate::api::leave_draft::open_draft,
        crate::api::leave_draft::get_draft,
        crate::api::leave_draft::edit_draft,
        crate::api::leave_draft::toggle_dropdown,
        crate::api::leave_draft::refresh_draft,
        crate::api::leave_draft::validate_draft,
        crate::api::leave_draft::submit_draft,
        crate::api::leave_draft::cancel_draft,

        crate::api::leave_request::list_categories,
        crate::api::leave_request::list_balances,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::leave_summary,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_attendance,
        crate::api::attendance::attendance_summary
    ),
    components(
        schemas(
            DraftView,
            DraftRequest,
            DropdownReq,
            ActiveDropdown,
            ComputedBalance,
            NormalizedRequest,
            SubmissionReceipt,
            LeaveCategory,
            EntitlementRecord,
            EntitlementBalance,
            LeaveRequest,
            LeaveStatus,
            LeaveFilter,
            LeavePage,
            LeaveCategorySummary,
            Attendance,
            AttendancePage,
            AttendanceQuery,
            AttendanceSummary,
            DateRangeQuery,
            GeoPoint
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave Draft", description = "Leave request drafts and submission"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
