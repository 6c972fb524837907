pub mod av_transport;
pub mod rendering_control;
pub mod zone_group_topology;

pub use av_transport::{
    AddURIToQueueOperation, AddURIToQueueOperationRequest, AddUriToQueueResponse,
    GetTransportInfoOperation, GetTransportInfoOperationRequest, NextOperation,
    NextOperationRequest, PlayMode, PlayOperation, PlayOperationRequest, PreviousOperation,
    PreviousOperationRequest, RemoveAllTracksFromQueueOperation,
    RemoveAllTracksFromQueueOperationRequest, SeekOperation, SeekOperationRequest,
    SetAVTransportURIOperation, SetAVTransportURIOperationRequest, SetPlayModeOperation,
    SetPlayModeOperationRequest, StopOperation, StopOperationRequest,
};
pub use rendering_control::{
    GetVolumeOperation, GetVolumeOperationRequest, SetVolumeOperation, SetVolumeOperationRequest,
    MASTER,
};
pub use zone_group_topology::{GetZoneGroupStateOperation, GetZoneGroupStateOperationRequest};
